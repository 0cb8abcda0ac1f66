//! Writing and reading records with an optional nested address.
//!
//! Demonstrates:
//! - Column names from `#[csv(name = ..)]` tags
//! - Flattening a nested record into prefixed columns
//! - Defaults for absent columns
//! - Concurrent reading with a callback
//!
//! Run with: cargo run --example people

use anyhow::Result;
use csvbind::{headers, read, record, write, ReadOptions};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

record! {
    #[derive(Debug, Clone)]
    pub struct PostalAddress {
        #[csv(name = "pin_code")]
        pub pin_code: String,
        #[csv(name = "address1")]
        pub line1: String,
        #[csv(name = "address2")]
        pub line2: String,
    }
}

record! {
    #[derive(Debug, Clone)]
    pub struct User {
        #[csv(name = "name")]
        pub name: String,
        #[csv(name = "age")]
        pub age: u32,
        #[csv(name = "email", default = "unknown@example.com")]
        pub email: String,
        #[csv(name = "address")]
        pub address: Option<PostalAddress>,
    }
}

fn main() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("users.csv");

    let users = vec![
        User {
            name: "John Doe".into(),
            age: 30,
            email: "john.doe@example.com".into(),
            address: Some(PostalAddress {
                pin_code: "123456".into(),
                line1: "123 Main St".into(),
                line2: "Apt 4B".into(),
            }),
        },
        User {
            name: "Jane Roe".into(),
            age: 41,
            email: String::new(),
            address: None,
        },
    ];

    println!("Columns: {}", headers::<User>()?.join(","));
    let written = write(&path, &users)?;
    println!("Wrote {written} users to {}\n", path.display());

    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    let rows = read(
        &path,
        ReadOptions::new()
            .with_concurrency(2)
            .with_handler(move |user: User| {
                counter.fetch_add(1, Ordering::Relaxed);
                println!("Read record: {user:?}");
                Ok(())
            }),
    )?;

    println!("\nDispatched {rows} rows, handled {}", seen.load(Ordering::Relaxed));
    Ok(())
}
