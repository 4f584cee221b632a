use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::{Duration, OffsetDateTime};

use pocket_money::{
    ChoreIcon, DefaultUser, Money, NewChore, NewGoal, PasswordHash, create_chore, create_goal,
    get_or_create_user, initialize_db,
};

/// A utility for creating a test database for the REST API server of pocket_money.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        Some(extension) if !extension.is_empty() => {}
        _ => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user...");

    let password_hash = PasswordHash::from_raw_password("password123", PasswordHash::DEFAULT_COST)?;
    let default_user = DefaultUser::new(DefaultUser::DEFAULT_USERNAME, password_hash);
    let now = OffsetDateTime::now_utc();
    let user = get_or_create_user(&default_user, now, &conn)?;

    println!("Creating chores...");

    let chores = [
        ("Feed the dog", ChoreIcon::Dog, Decimal::new(200, 2)),
        ("Wash the car", ChoreIcon::Car, Decimal::new(1000, 2)),
        ("Do the dishes", ChoreIcon::Utensils, Decimal::new(150, 2)),
        ("Vacuum the lounge", ChoreIcon::Vacuum, Decimal::new(300, 2)),
    ];

    for (offset, (name, icon, amount)) in chores.into_iter().enumerate() {
        create_chore(
            user.id,
            NewChore {
                name: name.to_owned(),
                description: None,
                amount: Money::new(amount),
                icon,
            },
            now + Duration::seconds(offset as i64),
            &conn,
        )?;
    }

    println!("Creating goals...");

    let goals = [
        ("New bike", Some("The blue one"), Decimal::new(25000, 2)),
        ("Video game", None, Decimal::new(6999, 2)),
    ];

    for (offset, (name, description, target)) in goals.into_iter().enumerate() {
        create_goal(
            user.id,
            NewGoal {
                name: name.to_owned(),
                description: description.map(str::to_owned),
                target_amount: Money::new(target),
            },
            now + Duration::seconds(offset as i64),
            &conn,
        )?;
    }

    println!("Success!");

    Ok(())
}
