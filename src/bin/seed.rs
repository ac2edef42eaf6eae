use std::sync::Arc;

use attendance_portal::{
    domain::{AnnouncementKind, CreateAnnouncementRequest, Department, NewDepartment, RegisterRequest, Role},
    repository::{
        DepartmentRepository, SqliteAnnouncementRepository, SqliteDepartmentRepository,
        SqliteUserRepository, UserRepository,
    },
    service::{announcement_service::AnnouncementService, user_service::UserService},
};
use chrono::{Duration, Utc};
use clap::Parser;
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use rand::Rng;
use sqlx::sqlite::SqlitePoolOptions;

const DEPARTMENTS: [(&str, &str, &str); 4] = [
    ("Computer Science", "CS", "Programming, algorithms and systems"),
    ("Mathematics", "MATH", "Pure and applied mathematics"),
    ("Physics", "PHYS", "Mechanics, optics and modern physics"),
    ("English", "ENG", "Language and literature"),
];

const DEMO_PASSWORD: &str = "password123";

#[derive(Debug, Parser)]
#[command(name = "seed", about = "Populate the attendance portal database")]
struct Args {
    #[arg(long, env = "DATABASE_URI", default_value = "sqlite://attendance.db?mode=rwc")]
    database_url: String,

    #[arg(long, default_value = "admin")]
    admin_username: String,

    #[arg(long, env = "SEED_ADMIN_PASSWORD", default_value = "admin123")]
    admin_password: String,

    /// Also create teachers, students, parents and sample announcements.
    #[arg(long)]
    demo: bool,

    #[arg(long, default_value_t = 5)]
    students_per_department: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    println!("🌱 Seeding {}", args.database_url);

    let db_pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&args.database_url)
        .await?;

    println!("📋 Running migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await?;

    let user_repo = Arc::new(SqliteUserRepository::new(db_pool.clone()));
    let department_repo = Arc::new(SqliteDepartmentRepository::new(db_pool.clone()));
    let announcement_repo = Arc::new(SqliteAnnouncementRepository::new(db_pool.clone()));

    let users = UserService::new(user_repo.clone(), department_repo.clone());
    let announcements = AnnouncementService::new(announcement_repo);

    println!("🏫 Creating departments...");
    let mut departments = department_repo.list().await?;
    for (name, code, description) in DEPARTMENTS {
        if departments.iter().any(|d| d.code == code) {
            continue;
        }
        let created = users
            .create_department(NewDepartment {
                name: name.to_string(),
                code: code.to_string(),
                description: Some(description.to_string()),
            })
            .await?;
        println!("  ✅ {} ({})", created.name, created.code);
        departments.push(created);
    }

    if user_repo.find_by_username(&args.admin_username).await?.is_none() {
        users
            .create_user(
                RegisterRequest {
                    username: args.admin_username.clone(),
                    email: format!("{}@school.local", args.admin_username),
                    full_name: "System Administrator".to_string(),
                    password: args.admin_password.clone(),
                    role: Role::Admin,
                    student_id: None,
                    parent_student_id: None,
                },
                None,
            )
            .await?;
        println!("👤 Created admin user ({})", args.admin_username);
    } else {
        println!("👤 Admin user {} already exists", args.admin_username);
    }

    if args.demo {
        for department in &departments {
            seed_department(&users, &announcements, user_repo.as_ref(), department, args.students_per_department)
                .await?;
        }
        println!("🔑 Demo accounts use the password '{}'", DEMO_PASSWORD);
    }

    println!("✨ Done");
    Ok(())
}

async fn seed_department(
    users: &UserService,
    announcements: &AnnouncementService,
    user_repo: &dyn UserRepository,
    department: &Department,
    students: usize,
) -> anyhow::Result<()> {
    let code = department.code.to_lowercase();
    let teacher_username = format!("teacher_{}", code);

    if user_repo.find_by_username(&teacher_username).await?.is_some() {
        println!("  ⏭️  {} already seeded", department.code);
        return Ok(());
    }

    println!("📚 Seeding {}...", department.name);

    let teacher = users
        .create_user(person(&teacher_username, Role::Teacher, None, None), Some(department.id))
        .await?;

    let mut rng = rand::thread_rng();
    for n in 1..=students {
        let student_id = format!("{}{:03}", department.code, n);
        let student_username = format!("{}_student{}", code, n);
        users
            .create_user(
                person(&student_username, Role::Student, Some(student_id.clone()), None),
                Some(department.id),
            )
            .await?;

        // Roughly two out of three students get a parent account.
        if rng.gen_ratio(2, 3) {
            users
                .create_user(
                    person(&format!("{}_parent{}", code, n), Role::Parent, None, Some(student_id)),
                    None,
                )
                .await?;
        }
    }

    let due = (Utc::now() + Duration::days(rng.gen_range(3..14))).naive_local();
    let samples = [
        (
            AnnouncementKind::Announcement,
            format!("Welcome to {}", department.name),
            "Welcome back! Please check this board regularly for updates.".to_string(),
            None,
        ),
        (
            AnnouncementKind::Assignment,
            format!("{} problem set 1", department.code),
            "Complete the first problem set and submit it before the due date.".to_string(),
            Some(due),
        ),
        (
            AnnouncementKind::Notice,
            "Room change this week".to_string(),
            "Classes this week take place in the main hall.".to_string(),
            None,
        ),
    ];

    for (kind, title, content, due_date) in samples {
        announcements
            .create(
                &teacher,
                CreateAnnouncementRequest {
                    title,
                    content,
                    announcement_type: kind,
                    due_date,
                    file: None,
                },
            )
            .await?;
    }

    println!("  ✅ 1 teacher, {} students, 3 announcements", students);
    Ok(())
}

fn person(
    username: &str,
    role: Role,
    student_id: Option<String>,
    parent_student_id: Option<String>,
) -> RegisterRequest {
    let first: String = FirstName().fake();
    let last: String = LastName().fake();

    RegisterRequest {
        username: username.to_string(),
        email: format!("{}@school.local", username),
        full_name: format!("{} {}", first, last),
        password: DEMO_PASSWORD.to_string(),
        role,
        student_id,
        parent_student_id,
    }
}
