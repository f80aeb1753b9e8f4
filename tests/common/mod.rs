//! Shared model declarations for the integration tests.

#![allow(dead_code)]

use once_cell::sync::Lazy;
use rest_models::{ClientConfig, FieldDef, Model, ModelState};
use serde_json::Value;

/// Persistable model with a flat resource URL.
#[derive(Debug, Clone, Default)]
pub struct Book {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub rating: Option<i64>,
    pub state: ModelState,
}

impl Model for Book {
    fn resource_name() -> &'static str {
        "book"
    }

    fn can_save() -> bool {
        true
    }

    fn fields() -> &'static [FieldDef<Self>] {
        static FIELDS: Lazy<Vec<FieldDef<Book>>> = Lazy::new(|| {
            vec![
                FieldDef::new(
                    "id",
                    |m| m.id.map(Value::from),
                    |m, v, _| {
                        m.id = v.as_i64();
                        Ok(())
                    },
                ),
                FieldDef::new(
                    "name",
                    |m| m.name.clone().map(Value::from),
                    |m, v, _| {
                        m.name = v.as_str().map(str::to_string);
                        Ok(())
                    },
                ),
                FieldDef::new(
                    "rating",
                    |m| m.rating.map(Value::from),
                    |m, v, _| {
                        m.rating = v.as_i64();
                        Ok(())
                    },
                ),
            ]
        });
        &FIELDS
    }

    fn state(&self) -> &ModelState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ModelState {
        &mut self.state
    }
}

/// Read-only model: saving must fail without touching the network.
#[derive(Debug, Clone, Default)]
pub struct Catalogue {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub state: ModelState,
}

impl Model for Catalogue {
    fn resource_name() -> &'static str {
        "catalogue"
    }

    fn fields() -> &'static [FieldDef<Self>] {
        static FIELDS: Lazy<Vec<FieldDef<Catalogue>>> = Lazy::new(|| {
            vec![
                FieldDef::new(
                    "id",
                    |m| m.id.map(Value::from),
                    |m, v, _| {
                        m.id = v.as_i64();
                        Ok(())
                    },
                ),
                FieldDef::new(
                    "name",
                    |m| m.name.clone().map(Value::from),
                    |m, v, _| {
                        m.name = v.as_str().map(str::to_string);
                        Ok(())
                    },
                ),
            ]
        });
        &FIELDS
    }

    fn state(&self) -> &ModelState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ModelState {
        &mut self.state
    }
}

/// Nested resource with a `{book_pk}` placeholder in its URL template.
#[derive(Debug, Clone, Default)]
pub struct Review {
    pub id: Option<i64>,
    pub text: Option<String>,
    pub state: ModelState,
}

impl Model for Review {
    fn resource_name() -> &'static str {
        "review"
    }

    fn url(config: &ClientConfig) -> String {
        format!("{}books/{{book_pk}}/reviews/", config.base_url)
    }

    fn fields() -> &'static [FieldDef<Self>] {
        static FIELDS: Lazy<Vec<FieldDef<Review>>> = Lazy::new(|| {
            vec![
                FieldDef::new(
                    "id",
                    |m| m.id.map(Value::from),
                    |m, v, _| {
                        m.id = v.as_i64();
                        Ok(())
                    },
                ),
                FieldDef::new(
                    "text",
                    |m| m.text.clone().map(Value::from),
                    |m, v, _| {
                        m.text = v.as_str().map(str::to_string);
                        Ok(())
                    },
                ),
            ]
        });
        &FIELDS
    }

    fn state(&self) -> &ModelState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ModelState {
        &mut self.state
    }
}

/// Config pointing at a mock server, mirroring the live layout's `/api/`
/// prefix.
pub fn server_config(server: &mockito::ServerGuard) -> ClientConfig {
    ClientConfig::new(format!("{}/api/", server.url()))
}
