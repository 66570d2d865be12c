use crate::model::{role::Role, student::Student, user::Account};
use crate::models::{LoginData, LoginReqDto, LoginResponse, MessageResponse};
use crate::service::{
    account::{NewAccountRequest, UpdateAccountRequest},
    attendance::{
        AttendanceView, CheckInOutcome, CheckInRequest, EditRecordRequest, StartSessionRequest,
    },
    report::{
        DailyEntry, MonthRecord, MonthlyCounts, Overview, Stats, WeeklyEntry, YearlyCounts,
    },
    roster::NewStudentRequest,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Campus Attendance API",
        version = "1.0.0",
        description = r#"
## Campus Attendance

Backend for the attendance dashboard used by teachers, admins and gate guards.

### Key Features
- **Roster** - list and register students
- **Attendance sessions** - start a session (one ABSENT row per student), check students in from the scanner, edit or delete rows
- **Reports** - daily, weekly, monthly, yearly and overview statistics
- **Accounts** - admin, teacher and guard logins

### Time zone
All dates are calendar dates in the single service timezone (`SERVICE_UTC_OFFSET`).

### Security
When `AUTH_REQUIRED=true`, every route except `/api/login` needs the bearer token returned by login.
"#,
    ),
    paths(
        crate::api::account::login,
        crate::api::account::list_accounts,
        crate::api::account::add_account,
        crate::api::account::update_account,
        crate::api::account::delete_account,

        crate::api::student::list_students,
        crate::api::student::add_student,

        crate::api::attendance::start_attendance,
        crate::api::attendance::check_in,
        crate::api::attendance::list_attendance,
        crate::api::attendance::get_attendance,
        crate::api::attendance::update_attendance,
        crate::api::attendance::delete_attendance,

        crate::api::report::daily,
        crate::api::report::weekly,
        crate::api::report::monthly,
        crate::api::report::monthly_report,
        crate::api::report::yearly,
        crate::api::report::overview,
        crate::api::report::stats,
        crate::api::report::professors
    ),
    components(
        schemas(
            Role,
            Account,
            Student,
            LoginReqDto,
            LoginData,
            LoginResponse,
            MessageResponse,
            NewAccountRequest,
            UpdateAccountRequest,
            NewStudentRequest,
            StartSessionRequest,
            CheckInRequest,
            CheckInOutcome,
            EditRecordRequest,
            AttendanceView,
            DailyEntry,
            WeeklyEntry,
            MonthRecord,
            MonthlyCounts,
            YearlyCounts,
            Overview,
            Stats
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login"),
        (name = "Accounts", description = "Account administration"),
        (name = "Students", description = "Student roster"),
        (name = "Attendance", description = "Attendance session lifecycle"),
        (name = "Reports", description = "Aggregate attendance statistics"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
