//! End-to-end service checks against a real MySQL database.
//! Run with `DATABASE_URL=mysql://... cargo test -- --ignored`.

use chrono::{FixedOffset, NaiveDateTime};
use sqlx::MySqlPool;

use crate::{
    clock::{self, ServiceClock},
    error::ServiceError,
    model::attendance::AttendanceStatus,
    models::LoginReqDto,
    service::{
        account::{AccountService, NewAccountRequest},
        attendance::{AttendanceService, CheckInRequest, EditRecordRequest, StartSessionRequest},
        report::ReportService,
        roster::{NewStudentRequest, RosterService},
    },
};

fn clock() -> ServiceClock {
    ServiceClock::new(FixedOffset::east_opt(8 * 3600).unwrap())
}

async fn add_student(roster: &RosterService, code: &str, name: &str) -> u64 {
    roster
        .add_student(&NewStudentRequest {
            student_id: Some(code.into()),
            name: Some(name.into()),
            section: Some("SBIT3I".into()),
            email: None,
            phone: None,
            address: None,
            photo: None,
            classification: Some("regular".into()),
        })
        .await
        .unwrap()
}

fn lecture() -> StartSessionRequest {
    StartSessionRequest {
        section: Some("SBIT3I".into()),
        session_type: Some("lecture".into()),
        start_time: Some("09:00".into()),
        end_time: Some("11:00".into()),
        subject_id: Some("SIA101".into()),
    }
}

async fn statuses(pool: &MySqlPool) -> Vec<(u64, String)> {
    sqlx::query_as("SELECT student_id, status FROM attendance ORDER BY student_id")
        .fetch_all(pool)
        .await
        .unwrap()
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL pointing at MySQL"]
async fn session_check_in_and_daily_report(pool: MySqlPool) {
    let roster = RosterService::new(pool.clone());
    let attendance = AttendanceService::new(pool.clone(), clock());
    let reports = ReportService::new(pool.clone(), clock());

    let s1 = add_student(&roster, "2021-0001", "Ana").await;
    let s2 = add_student(&roster, "2021-0002", "Ben").await;

    assert_eq!(attendance.start_session(&lecture()).await.unwrap(), 2);
    assert_eq!(
        statuses(&pool).await,
        vec![(s1, "ABSENT".to_string()), (s2, "ABSENT".to_string())]
    );

    let today = clock::format_date(clock().today());
    let outcome = attendance
        .check_in(&CheckInRequest {
            student_id: Some(s1),
            photo: Some("<img>".into()),
            date: Some(today.clone()),
        })
        .await
        .unwrap();
    assert_eq!(outcome.attendance_date, today);

    let daily = reports.daily(None).await.unwrap();
    assert_eq!(daily.len(), 2);
    let by_name = |n: &str| daily.iter().find(|e| e.student_name == n).unwrap().status.clone();
    assert_eq!(by_name("Ana"), "PRESENT");
    assert_eq!(by_name("Ben"), "ABSENT");

    let listed = attendance.list_records().await.unwrap();
    let ana = listed.iter().find(|r| r.student_id == s1).unwrap();
    assert_eq!(ana.time_in.as_deref(), Some(outcome.time_in.as_str()));
    assert_eq!(ana.photo.as_deref(), Some("<img>"));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL pointing at MySQL"]
async fn empty_roster_starts_an_empty_session(pool: MySqlPool) {
    let attendance = AttendanceService::new(pool.clone(), clock());
    assert_eq!(attendance.start_session(&lecture()).await.unwrap(), 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL pointing at MySQL"]
async fn check_in_without_a_session_is_not_found(pool: MySqlPool) {
    let roster = RosterService::new(pool.clone());
    let attendance = AttendanceService::new(pool.clone(), clock());
    let s1 = add_student(&roster, "2021-0001", "Ana").await;

    let err = attendance
        .check_in(&CheckInRequest { student_id: Some(s1), photo: None, date: None })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL pointing at MySQL"]
async fn delete_twice_is_not_found(pool: MySqlPool) {
    let roster = RosterService::new(pool.clone());
    let attendance = AttendanceService::new(pool.clone(), clock());
    add_student(&roster, "2021-0001", "Ana").await;
    attendance.start_session(&lecture()).await.unwrap();

    let id = attendance.list_records().await.unwrap()[0].id;
    attendance.delete_record(id).await.unwrap();
    let err = attendance.delete_record(id).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL pointing at MySQL"]
async fn edit_overwrites_and_rejects_bad_input(pool: MySqlPool) {
    let roster = RosterService::new(pool.clone());
    let attendance = AttendanceService::new(pool.clone(), clock());
    let s1 = add_student(&roster, "2021-0001", "Ana").await;
    attendance.start_session(&lecture()).await.unwrap();
    let id = attendance.list_records().await.unwrap()[0].id;

    let bad = EditRecordRequest {
        student_id: Some(s1),
        time_in: Some("08:00".into()),
        attendance_date: Some("not a date".into()),
        status: Some("LATE".into()),
        photo: None,
    };
    assert!(matches!(attendance.edit_record(id, &bad).await, Err(ServiceError::Validation(_))));
    assert_eq!(statuses(&pool).await[0].1, "ABSENT");

    let good = EditRecordRequest { attendance_date: Some("2026-10-17".into()), ..bad };
    attendance.edit_record(id, &good).await.unwrap();
    let record = attendance.get_record(id).await.unwrap();
    assert_eq!(record.status, AttendanceStatus::Late.to_string());
    assert_eq!(record.time_in.as_deref(), Some("2026-10-17 08:00:00"));

    let missing = attendance.edit_record(id + 1000, &good).await.unwrap_err();
    assert!(matches!(missing, ServiceError::NotFound(_)));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL pointing at MySQL"]
async fn stats_and_monthly_counts(pool: MySqlPool) {
    let roster = RosterService::new(pool.clone());
    let reports = ReportService::new(pool.clone(), clock());

    let stats = reports.stats().await.unwrap();
    assert_eq!(stats.attendance_rate, 0.0);

    let s1 = add_student(&roster, "2021-0001", "Ana").await;
    for (date, status) in [
        ("2026-09-01", "PRESENT"),
        ("2026-09-02", "PRESENT"),
        ("2026-10-01", "ABSENT"),
    ] {
        sqlx::query(
            "INSERT INTO attendance (student_id, attendance_date, status, section, subject_id, type, start_time, end_time) \
             VALUES (?, ?, ?, 'SBIT3I', 'SIA101', 'lecture', '09:00:00', '11:00:00')",
        )
        .bind(s1)
        .bind(date)
        .bind(status)
        .execute(&pool)
        .await
        .unwrap();
    }

    let months = reports.monthly().await.unwrap();
    assert_eq!(months.len(), 2);
    assert_eq!((months[0].present, months[0].absent, months[0].late), (2, 0, 0));
    assert_eq!((months[1].present, months[1].absent, months[1].late), (0, 1, 0));

    let stats = reports.stats().await.unwrap();
    assert_eq!(stats.total_students, 1);
    assert_eq!(stats.total_attendance_entries, 3);
    assert_eq!(stats.attendance_rate, 66.7);

    let overview = reports.overview().await.unwrap();
    assert_eq!(overview.attendance_breakdown, vec![2, 1, 0]);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL pointing at MySQL"]
async fn login_does_not_reveal_which_part_was_wrong(pool: MySqlPool) {
    let accounts = AccountService::new(pool.clone(), "secret-key".into(), 60);
    let created = accounts
        .add_account(&NewAccountRequest {
            email: Some("a@x.com".into()),
            role: Some("teacher".into()),
            password: Some("secret".into()),
        })
        .await
        .unwrap();
    assert_eq!(created.role, "teacher");

    let stored: String = sqlx::query_scalar("SELECT password FROM users WHERE id = ?")
        .bind(created.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_ne!(stored, "secret");

    let login = |email: &str, password: &str| LoginReqDto {
        email: Some(email.into()),
        password: Some(password.into()),
    };

    let ok = accounts.login(&login("a@x.com", "secret")).await.unwrap();
    assert_eq!(ok.user_id, created.id);

    let wrong_password = accounts.login(&login("a@x.com", "wrong")).await.unwrap_err();
    let unknown_email = accounts.login(&login("nouser@x.com", "anything")).await.unwrap_err();
    assert!(matches!(wrong_password, ServiceError::Auth(_)));
    assert_eq!(wrong_password.to_string(), unknown_email.to_string());

    let dup = accounts
        .add_account(&NewAccountRequest {
            email: Some("a@x.com".into()),
            role: Some("guard".into()),
            password: Some("pw".into()),
        })
        .await
        .unwrap_err();
    assert!(matches!(dup, ServiceError::Conflict(_)));

    accounts.delete_account(created.id).await.unwrap();
    assert!(matches!(
        accounts.delete_account(created.id).await,
        Err(ServiceError::NotFound(_))
    ));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL pointing at MySQL"]
async fn repeated_check_ins_fill_the_days_sessions_in_order(pool: MySqlPool) {
    let roster = RosterService::new(pool.clone());
    let attendance = AttendanceService::new(pool.clone(), clock());
    let s1 = add_student(&roster, "2021-0001", "Ana").await;

    attendance.start_session(&lecture()).await.unwrap();
    let lab = StartSessionRequest {
        session_type: Some("laboratory".into()),
        start_time: Some("13:00".into()),
        end_time: Some("15:00".into()),
        ..lecture()
    };
    attendance.start_session(&lab).await.unwrap();

    let rows = || async {
        sqlx::query_as::<_, (u64, String, Option<String>, Option<NaiveDateTime>)>(
            "SELECT id, status, photo, time_in FROM attendance ORDER BY id",
        )
        .fetch_all(&pool)
        .await
        .unwrap()
    };
    let check_in = |photo: &str| CheckInRequest {
        student_id: Some(s1),
        photo: Some(photo.into()),
        date: None,
    };

    attendance.check_in(&check_in("first")).await.unwrap();
    let after_one = rows().await;
    assert_eq!(after_one.len(), 2);
    assert_eq!(after_one[0].1, "PRESENT");
    assert_eq!(after_one[0].2.as_deref(), Some("first"));
    assert!(after_one[0].3.is_some());
    assert_eq!(after_one[1].1, "ABSENT");
    assert!(after_one[1].3.is_none());

    attendance.check_in(&check_in("second")).await.unwrap();
    let after_two = rows().await;
    assert_eq!(after_two[0].2.as_deref(), Some("first"));
    assert_eq!(after_two[1].1, "PRESENT");
    assert_eq!(after_two[1].2.as_deref(), Some("second"));

    // nothing left ABSENT: the earliest row is re-stamped, no row is added
    let third = attendance.check_in(&check_in("third")).await.unwrap();
    let after_three = rows().await;
    assert_eq!(after_three.len(), 2);
    assert_eq!(after_three[0].2.as_deref(), Some("third"));
    assert_eq!(after_three[1].2.as_deref(), Some("second"));

    let first = attendance.get_record(after_three[0].0).await.unwrap();
    assert_eq!(first.status, "PRESENT");
    assert_eq!(first.time_in.as_deref(), Some(third.time_in.as_str()));
}
