#[cfg(test)]
mod tests {
    use crate::common::error::is_unique_violation;
    use crate::common::schema::init_schema;
    use crate::common::ApiError;
    use crate::relations::toggle::*;
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
    use sqlx::SqlitePool;
    use std::str::FromStr;

    async fn setup_test_db() -> SqlitePool {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .unwrap()
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .unwrap();

        init_schema(&pool).await.unwrap();
        pool
    }

    async fn insert_user(pool: &SqlitePool, id: &str, username: &str) {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, username, first_name, last_name, password_hash)
            VALUES (?, ?, ?, 'Test', 'User', 'hash')
            "#,
        )
        .bind(id)
        .bind(format!("{}@example.com", username))
        .bind(username)
        .execute(pool)
        .await
        .unwrap();
    }

    async fn insert_recipe(pool: &SqlitePool, id: &str, author_id: &str, name: &str) {
        sqlx::query(
            r#"
            INSERT INTO recipes (id, author_id, name, image, text, cooking_time)
            VALUES (?, ?, ?, 'r.png', 'steps', 10)
            "#,
        )
        .bind(id)
        .bind(author_id)
        .bind(name)
        .execute(pool)
        .await
        .unwrap();
    }

    async fn count_rows(pool: &SqlitePool, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_add_and_check_relation() {
        let pool = setup_test_db().await;
        insert_user(&pool, "U_AUTHOR", "author").await;
        insert_user(&pool, "U_VIEWER", "viewer").await;
        insert_recipe(&pool, "R_SOUP01", "U_AUTHOR", "Soup").await;

        add_relation(&pool, RelationKind::Favorite, "U_VIEWER", "R_SOUP01")
            .await
            .unwrap();

        assert!(
            is_related(&pool, RelationKind::Favorite, "U_VIEWER", "R_SOUP01")
                .await
                .unwrap()
        );
        // Same pair, different kind: untouched
        assert!(
            !is_related(&pool, RelationKind::ShoppingCart, "U_VIEWER", "R_SOUP01")
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_duplicate_add_reports_already_exists() {
        let pool = setup_test_db().await;
        insert_user(&pool, "U_AUTHOR", "author").await;
        insert_user(&pool, "U_VIEWER", "viewer").await;
        insert_recipe(&pool, "R_SOUP01", "U_AUTHOR", "Soup").await;

        add_relation(&pool, RelationKind::Favorite, "U_VIEWER", "R_SOUP01")
            .await
            .unwrap();

        let err = add_relation(&pool, RelationKind::Favorite, "U_VIEWER", "R_SOUP01")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RelationError::AlreadyExists(RelationKind::Favorite)
        ));

        // Still exactly one row
        assert_eq!(count_rows(&pool, "favorites").await, 1);
    }

    #[tokio::test]
    async fn test_unique_constraint_backstops_the_check() {
        let pool = setup_test_db().await;
        insert_user(&pool, "U_AUTHOR", "author").await;
        insert_user(&pool, "U_VIEWER", "viewer").await;
        insert_recipe(&pool, "R_SOUP01", "U_AUTHOR", "Soup").await;

        add_relation(&pool, RelationKind::ShoppingCart, "U_VIEWER", "R_SOUP01")
            .await
            .unwrap();

        // A concurrent identical insert loses at the database level and the
        // error is recognizable as a unique violation, which add_relation
        // maps to AlreadyExists
        let raw = sqlx::query(
            "INSERT INTO shopping_cart (id, user_id, recipe_id) VALUES ('C_RACE01', 'U_VIEWER', 'R_SOUP01')",
        )
        .execute(&pool)
        .await
        .unwrap_err();

        assert!(is_unique_violation(&raw));
        assert_eq!(count_rows(&pool, "shopping_cart").await, 1);
    }

    #[tokio::test]
    async fn test_remove_absent_reports_not_related() {
        let pool = setup_test_db().await;
        insert_user(&pool, "U_AUTHOR", "author").await;
        insert_user(&pool, "U_VIEWER", "viewer").await;
        insert_recipe(&pool, "R_SOUP01", "U_AUTHOR", "Soup").await;

        let err = remove_relation(&pool, RelationKind::Favorite, "U_VIEWER", "R_SOUP01")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RelationError::NotRelated(RelationKind::Favorite)
        ));
    }

    #[tokio::test]
    async fn test_toggle_cycle() {
        let pool = setup_test_db().await;
        insert_user(&pool, "U_AUTHOR", "author").await;
        insert_user(&pool, "U_VIEWER", "viewer").await;
        insert_recipe(&pool, "R_SOUP01", "U_AUTHOR", "Soup").await;

        add_relation(&pool, RelationKind::Favorite, "U_VIEWER", "R_SOUP01")
            .await
            .unwrap();
        remove_relation(&pool, RelationKind::Favorite, "U_VIEWER", "R_SOUP01")
            .await
            .unwrap();
        assert!(
            !is_related(&pool, RelationKind::Favorite, "U_VIEWER", "R_SOUP01")
                .await
                .unwrap()
        );

        // Re-adding after removal works
        add_relation(&pool, RelationKind::Favorite, "U_VIEWER", "R_SOUP01")
            .await
            .unwrap();
        assert_eq!(count_rows(&pool, "favorites").await, 1);
    }

    #[tokio::test]
    async fn test_self_subscription_rejected() {
        let pool = setup_test_db().await;
        insert_user(&pool, "U_LONELY", "lonely").await;

        let err = add_relation(&pool, RelationKind::Subscription, "U_LONELY", "U_LONELY")
            .await
            .unwrap_err();
        assert!(matches!(err, RelationError::SelfSubscription));
        assert_eq!(count_rows(&pool, "subscriptions").await, 0);
    }

    #[tokio::test]
    async fn test_subscription_is_directional() {
        let pool = setup_test_db().await;
        insert_user(&pool, "U_READER", "reader").await;
        insert_user(&pool, "U_AUTHOR", "author").await;

        add_relation(&pool, RelationKind::Subscription, "U_READER", "U_AUTHOR")
            .await
            .unwrap();

        assert!(
            is_related(&pool, RelationKind::Subscription, "U_READER", "U_AUTHOR")
                .await
                .unwrap()
        );
        assert!(
            !is_related(&pool, RelationKind::Subscription, "U_AUTHOR", "U_READER")
                .await
                .unwrap()
        );
    }

    #[test]
    fn test_relation_errors_map_to_conflict() {
        let already: ApiError = RelationError::AlreadyExists(RelationKind::Favorite).into();
        match already {
            ApiError::Conflict(msg) => assert_eq!(msg, "recipe is already in favorites"),
            other => panic!("expected Conflict, got {:?}", other),
        }

        let missing: ApiError = RelationError::NotRelated(RelationKind::ShoppingCart).into();
        match missing {
            ApiError::Conflict(msg) => assert_eq!(msg, "recipe is not in shopping cart"),
            other => panic!("expected Conflict, got {:?}", other),
        }

        let selfsub: ApiError = RelationError::SelfSubscription.into();
        match selfsub {
            ApiError::Conflict(msg) => assert_eq!(msg, "cannot subscribe to yourself"),
            other => panic!("expected Conflict, got {:?}", other),
        }
    }
}
