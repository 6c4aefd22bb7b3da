use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, PgExecutor};
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "event_mode", rename_all = "lowercase")]
pub enum EventMode {
    Online,
    #[default]
    Offline,
    Hybrid,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub image: Option<String>,
    pub location: Option<String>,
    pub venue: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub mode: EventMode,
    pub audience: Option<String>,
    pub overview: Option<String>,
    pub description: Option<String>,
    pub organizer: Option<String>,
    pub tags: Json<Vec<String>>,
    pub agenda: Json<Vec<String>>,
    pub booked_spots: i32,
}

/// Writable part of an event. `booked_spots` is owned by the booking flow and never accepted here.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct EventInput {
    #[validate(length(min = 1, max = 255), custom(function = "validate_slug"))]
    pub slug: String,
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub title: String,
    #[validate(length(max = 500))]
    pub image: Option<String>,
    pub location: Option<String>,
    pub venue: Option<String>,
    #[validate(length(max = 50))]
    pub date: Option<String>,
    #[validate(length(max = 50))]
    pub time: Option<String>,
    #[serde(default)]
    pub mode: EventMode,
    pub audience: Option<String>,
    pub overview: Option<String>,
    pub description: Option<String>,
    pub organizer: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub agenda: Vec<String>,
}

/// Lowercase ASCII words joined by single hyphens, e.g. `react-conf-2026`.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .split('-')
            .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit()))
}

fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if is_valid_slug(slug) {
        Ok(())
    } else {
        Err(ValidationError::new("slug")
            .with_message("slug must be lowercase letters and digits separated by single hyphens".into()))
    }
}

const EVENT_COLUMNS: &str = "id, slug, title, image, location, venue, date, time, mode, \
     audience, overview, description, organizer, tags, agenda, booked_spots";

impl Event {
    pub async fn list<'e>(db: impl PgExecutor<'e>) -> Result<Vec<Event>, sqlx::Error> {
        sqlx::query_as::<_, Event>(&format!("SELECT {EVENT_COLUMNS} FROM events ORDER BY id"))
            .fetch_all(db)
            .await
    }

    pub async fn find_by_slug<'e>(
        slug: &str,
        db: impl PgExecutor<'e>,
    ) -> Result<Option<Event>, sqlx::Error> {
        sqlx::query_as::<_, Event>(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE slug = $1"))
            .bind(slug)
            .fetch_optional(db)
            .await
    }

    pub async fn count<'e>(db: impl PgExecutor<'e>) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM events")
            .fetch_one(db)
            .await
    }

    pub async fn insert<'e>(input: &EventInput, db: impl PgExecutor<'e>) -> Result<Event, sqlx::Error> {
        sqlx::query_as::<_, Event>(&format!(
            "INSERT INTO events (slug, title, image, location, venue, date, time, mode, \
                                 audience, overview, description, organizer, tags, agenda, booked_spots) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, 0) \
             RETURNING {EVENT_COLUMNS}"
        ))
        .bind(&input.slug)
        .bind(&input.title)
        .bind(&input.image)
        .bind(&input.location)
        .bind(&input.venue)
        .bind(&input.date)
        .bind(&input.time)
        .bind(input.mode)
        .bind(&input.audience)
        .bind(&input.overview)
        .bind(&input.description)
        .bind(&input.organizer)
        .bind(Json(&input.tags))
        .bind(Json(&input.agenda))
        .fetch_one(db)
        .await
    }

    /// Replaces every writable column of the event currently stored under `slug`.
    pub async fn update_by_slug<'e>(
        slug: &str,
        input: &EventInput,
        db: impl PgExecutor<'e>,
    ) -> Result<Option<Event>, sqlx::Error> {
        sqlx::query_as::<_, Event>(&format!(
            "UPDATE events SET slug = $2, title = $3, image = $4, location = $5, venue = $6, \
                    date = $7, time = $8, mode = $9, audience = $10, overview = $11, \
                    description = $12, organizer = $13, tags = $14, agenda = $15 \
             WHERE slug = $1 \
             RETURNING {EVENT_COLUMNS}"
        ))
        .bind(slug)
        .bind(&input.slug)
        .bind(&input.title)
        .bind(&input.image)
        .bind(&input.location)
        .bind(&input.venue)
        .bind(&input.date)
        .bind(&input.time)
        .bind(input.mode)
        .bind(&input.audience)
        .bind(&input.overview)
        .bind(&input.description)
        .bind(&input.organizer)
        .bind(Json(&input.tags))
        .bind(Json(&input.agenda))
        .fetch_optional(db)
        .await
    }

    pub async fn delete_by_slug<'e>(slug: &str, db: impl PgExecutor<'e>) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM events WHERE slug = $1")
            .bind(slug)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn increment_booked_spots<'e>(slug: &str, db: impl PgExecutor<'e>) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE events SET booked_spots = booked_spots + 1 WHERE slug = $1")
            .bind(slug)
            .execute(db)
            .await?;
        Ok(())
    }

    // Floored at zero; the column also carries a CHECK (booked_spots >= 0).
    pub async fn decrement_booked_spots<'e>(slug: &str, db: impl PgExecutor<'e>) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE events SET booked_spots = GREATEST(booked_spots - 1, 0) WHERE slug = $1")
            .bind(slug)
            .execute(db)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn input(slug: &str) -> EventInput {
        EventInput {
            slug: slug.to_string(),
            title: "React Conference 2026".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn slug_rules() {
        assert!(is_valid_slug("react-conf-2026"));
        assert!(is_valid_slug("meetup"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("React-Conf"));
        assert!(!is_valid_slug("double--hyphen"));
        assert!(!is_valid_slug("-leading"));
        assert!(!is_valid_slug("trailing-"));
        assert!(!is_valid_slug("has space"));
    }

    #[test]
    fn input_validation() {
        assert!(input("nextjs-16-workshop").validate().is_ok());

        let errors = input("Not A Slug").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("slug"));

        let mut untitled = input("ok");
        untitled.title.clear();
        let errors = untitled.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("title"));
    }

    #[test]
    fn input_defaults_mode_tags_and_agenda() {
        let parsed: EventInput =
            serde_json::from_str(r#"{"slug":"a","title":"A"}"#).unwrap();
        assert_eq!(parsed.mode, EventMode::Offline);
        assert!(parsed.tags.is_empty());
        assert!(parsed.agenda.is_empty());
    }

    #[test]
    fn input_ignores_booked_spots() {
        let parsed: EventInput =
            serde_json::from_str(r#"{"slug":"a","title":"A","booked_spots":99}"#).unwrap();
        assert_eq!(parsed.slug, "a");
    }

    #[test]
    fn mode_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&EventMode::Hybrid).unwrap(), r#""hybrid""#);
        let mode: EventMode = serde_json::from_str(r#""online""#).unwrap();
        assert_eq!(mode, EventMode::Online);
        assert!(serde_json::from_str::<EventMode>(r#""in-person""#).is_err());
    }

    #[test]
    fn event_json_shape() {
        let event = Event {
            id: 1,
            slug: "react-conf-2026".into(),
            title: "React Conference 2026".into(),
            image: None,
            location: Some("San Francisco, CA".into()),
            venue: None,
            date: Some("2026-12-12".into()),
            time: Some("09:00".into()),
            mode: EventMode::Hybrid,
            audience: None,
            overview: None,
            description: None,
            organizer: None,
            tags: Json(vec!["react".into()]),
            agenda: Json(vec!["Opening Keynote".into()]),
            booked_spots: 3,
        };

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["mode"], "hybrid");
        assert_eq!(value["tags"], serde_json::json!(["react"]));
        assert_eq!(value["agenda"], serde_json::json!(["Opening Keynote"]));
        assert_eq!(value["booked_spots"], 3);
    }

    proptest! {
        #[test]
        fn generated_slugs_are_valid(slug in "[a-z0-9]{1,8}(-[a-z0-9]{1,8}){0,4}") {
            prop_assert!(is_valid_slug(&slug));
        }

        #[test]
        fn slugs_with_uppercase_are_rejected(prefix in "[a-z]{0,5}", upper in "[A-Z]", suffix in "[a-z]{0,5}") {
            let slug = format!("{prefix}{upper}{suffix}");
            prop_assert!(!is_valid_slug(&slug));
        }
    }
}
