//! Record types shared by the integration tests.
#![allow(dead_code)]

use csvbind::{record, Field, FieldKind, FieldRef, Scalar};
use std::fs;
use std::path::{Path, PathBuf};

record! {
    #[derive(Debug, Clone, PartialEq, Default)]
    pub struct Address {
        #[csv(name = "street")]
        pub street: String,
        #[csv(name = "city")]
        pub city: String,
    }
}

record! {
    #[derive(Debug, Clone, PartialEq, Default)]
    pub struct Person {
        #[csv(name = "name")]
        pub name: String,
        #[csv(name = "age")]
        pub age: i32,
        #[csv(name = "address")]
        pub address: Address,
    }
}

record! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct PersonOpt {
        #[csv(name = "name")]
        pub name: String,
        #[csv(name = "age")]
        pub age: i32,
        #[csv(name = "address")]
        pub address: Option<Address>,
    }
}

record! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct Contact {
        #[csv(name = "Name")]
        pub name: String,
        #[csv(name = "Age", default = "18")]
        pub age: u8,
        #[csv(name = "Email", default = "unknown@example.com")]
        pub email: String,
    }
}

record! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct Reading {
        pub id: u64,
        pub label: String,
        pub offset: i16,
        pub value: f64,
        pub ratio: f32,
        pub ok: bool,
    }
}

record! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct Geo {
        pub lat: f64,
        pub lon: f64,
    }
}

record! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct Site {
        pub code: String,
        #[csv(name = "loc")]
        pub location: Geo,
    }
}

record! {
    /// Three levels deep, with an optional branch in the middle.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Shipment {
        pub id: u32,
        #[csv(name = "from")]
        pub origin: Site,
        #[csv(name = "to")]
        pub destination: Option<Site>,
        #[csv(name = "urgent", default = "true")]
        pub urgent: bool,
    }
}

/// A value with no cell encoding.
#[derive(Debug, Clone, Copy)]
pub struct Glyph(pub char);

impl Field for Glyph {
    fn kind() -> FieldKind {
        FieldKind::Unsupported("Glyph")
    }

    fn materialize() -> Self {
        Glyph(' ')
    }

    fn get(&self) -> FieldRef<'_> {
        FieldRef::Scalar(Scalar::String(self.0.to_string()))
    }
}

record! {
    #[derive(Debug)]
    pub struct Initialed {
        pub name: String,
        pub initial: Glyph,
    }
}

record! {
    #[derive(Debug)]
    pub struct Chain {
        pub id: i64,
        pub next: Option<Box<Chain>>,
    }
}

pub fn person(name: &str, age: i32, street: &str, city: &str) -> Person {
    Person {
        name: name.into(),
        age,
        address: Address {
            street: street.into(),
            city: city.into(),
        },
    }
}

/// Write `contents` to `name` inside `dir` and return the path.
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write fixture");
    path
}
