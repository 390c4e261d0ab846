// API routes and handlers

pub mod action_types;
pub mod auth;
pub mod health;
pub mod levels;
pub mod routes;
pub mod steps;
pub mod tags;
pub mod trainings;

use serde::Deserialize;

/// Plain limit/offset pagination, shared by the listing endpoints.
#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PaginationQuery {
    pub fn validate(&self) -> Result<(), &'static str> {
        if let Some(limit) = self.limit {
            if !(1..=500).contains(&limit) {
                return Err("Limit must be between 1 and 500");
            }
        }
        if let Some(offset) = self.offset {
            if offset < 0 {
                return Err("Offset must be non-negative");
            }
        }
        Ok(())
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(100).clamp(1, 500)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        let query = PaginationQuery {
            limit: None,
            offset: None,
        };
        assert!(query.validate().is_ok());
        assert_eq!(query.limit(), 100);
        assert_eq!(query.offset(), 0);
    }

    #[test]
    fn test_pagination_bounds() {
        let query = PaginationQuery {
            limit: Some(0),
            offset: None,
        };
        assert!(query.validate().is_err());

        let query = PaginationQuery {
            limit: Some(501),
            offset: Some(-1),
        };
        assert!(query.validate().is_err());

        let query = PaginationQuery {
            limit: Some(500),
            offset: Some(10),
        };
        assert!(query.validate().is_ok());
        assert_eq!(query.limit(), 500);
        assert_eq!(query.offset(), 10);
    }
}
