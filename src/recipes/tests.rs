#[cfg(test)]
mod tests {
    use crate::auth::{AuthedUser, OptionalUser, User};
    use crate::common::schema::init_schema;
    use crate::common::{
        generate_ingredient_id, generate_recipe_id, generate_recipe_ingredient_id,
        generate_user_id, ApiError, AppState, Validator,
    };
    use crate::recipes::handlers::{crud, links, relations, shopping_list};
    use crate::recipes::models::*;
    use crate::recipes::validators::RecipeValidator;
    use crate::relations::{add_relation, RelationKind};
    use axum::extract::{Extension, Path, Query};
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Json};
    use chrono::TimeZone;
    use chrono::Utc;
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
    use sqlx::SqlitePool;
    use std::str::FromStr;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    // 1x1 transparent PNG
    const TINY_PNG: &str =
        "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8BQDwAEhQGAhKmMIQAAAABJRU5ErkJggg==";

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

    fn test_state(pool: SqlitePool) -> Arc<RwLock<AppState>> {
        Arc::new(RwLock::new(AppState {
            db: pool,
            avatars_dir: std::env::temp_dir(),
            recipe_images_dir: std::env::temp_dir(),
            jwt_secret: "test_secret".to_string(),
            base_url: "http://localhost:8080".to_string(),
        }))
    }

    async fn insert_user(pool: &SqlitePool, username: &str) -> String {
        let id = generate_user_id();
        sqlx::query(
            r#"
            INSERT INTO users (id, email, username, first_name, last_name, password_hash)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(format!("{}@example.com", username))
        .bind(username)
        .bind("Ada")
        .bind("Lovelace")
        .bind("not-a-real-hash")
        .execute(pool)
        .await
        .unwrap();
        id
    }

    async fn insert_ingredient(pool: &SqlitePool, name: &str, unit: &str) -> String {
        let id = generate_ingredient_id();
        sqlx::query("INSERT INTO ingredients (id, name, measurement_unit) VALUES (?, ?, ?)")
            .bind(&id)
            .bind(name)
            .bind(unit)
            .execute(pool)
            .await
            .unwrap();
        id
    }

    async fn insert_recipe(pool: &SqlitePool, author_id: &str, name: &str, pub_date: &str) -> String {
        let id = generate_recipe_id();
        sqlx::query(
            r#"
            INSERT INTO recipes (id, author_id, name, text, cooking_time, pub_date)
            VALUES (?, ?, ?, 'steps', 10, ?)
            "#,
        )
        .bind(&id)
        .bind(author_id)
        .bind(name)
        .bind(pub_date)
        .execute(pool)
        .await
        .unwrap();
        id
    }

    async fn link_ingredient(pool: &SqlitePool, recipe_id: &str, ingredient_id: &str, amount: i64) {
        sqlx::query(
            r#"
            INSERT INTO recipe_ingredients (id, recipe_id, ingredient_id, amount)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(generate_recipe_ingredient_id())
        .bind(recipe_id)
        .bind(ingredient_id)
        .bind(amount)
        .execute(pool)
        .await
        .unwrap();
    }

    fn authed(id: &str, username: &str) -> AuthedUser {
        AuthedUser {
            id: id.to_string(),
            email: format!("{}@example.com", username),
            username: username.to_string(),
        }
    }

    fn write_payload(ingredients: Vec<(&str, i64)>, image: Option<String>) -> RecipeWriteRequest {
        RecipeWriteRequest {
            ingredients: ingredients
                .into_iter()
                .map(|(id, amount)| IngredientAmountRequest {
                    id: id.to_string(),
                    amount,
                })
                .collect(),
            image,
            name: "Pancakes".to_string(),
            text: "Mix and fry".to_string(),
            cooking_time: 20,
        }
    }

    // ========================================================================
    // Validator Tests
    // ========================================================================

    #[test]
    fn test_recipe_validator_accepts_valid_payload() {
        let payload = write_payload(vec![("I_AAAAAA", 100)], None);
        assert!(RecipeValidator.validate(&payload).is_valid);
    }

    #[test]
    fn test_recipe_validator_rejects_empty_ingredients() {
        let payload = write_payload(vec![], None);
        let result = RecipeValidator.validate(&payload);
        assert!(!result.is_valid);
        assert!(result.has_error_on("ingredients"));
    }

    #[test]
    fn test_recipe_validator_rejects_duplicate_ingredients() {
        let payload = write_payload(vec![("I_AAAAAA", 100), ("I_AAAAAA", 50)], None);
        assert!(RecipeValidator
            .validate(&payload)
            .has_error_on("ingredients"));
    }

    #[test]
    fn test_recipe_validator_rejects_amount_below_one() {
        let payload = write_payload(vec![("I_AAAAAA", 0)], None);
        assert!(RecipeValidator
            .validate(&payload)
            .has_error_on("ingredients"));
    }

    #[test]
    fn test_recipe_validator_rejects_bad_fields() {
        let mut payload = write_payload(vec![("I_AAAAAA", 100)], None);
        payload.name = "  ".to_string();
        payload.text = "".to_string();
        payload.cooking_time = 0;
        let result = RecipeValidator.validate(&payload);
        assert!(result.has_error_on("name"));
        assert!(result.has_error_on("text"));
        assert!(result.has_error_on("cooking_time"));

        let mut long_name = write_payload(vec![("I_AAAAAA", 100)], None);
        long_name.name = "a".repeat(257);
        assert!(RecipeValidator.validate(&long_name).has_error_on("name"));
    }

    // ========================================================================
    // CRUD Handler Tests
    // ========================================================================

    #[tokio::test]
    async fn test_create_recipe_returns_full_projection() {
        let pool = setup_test_db().await;
        let author_id = insert_user(&pool, "chef").await;
        let flour = insert_ingredient(&pool, "flour", "g").await;
        let egg = insert_ingredient(&pool, "egg", "pcs").await;
        let state = test_state(pool.clone());

        let (status, Json(recipe)) = crud::create_recipe(
            Extension(state),
            authed(&author_id, "chef"),
            Json(write_payload(
                vec![(flour.as_str(), 200), (egg.as_str(), 2)],
                Some(format!("data:image/png;base64,{}", TINY_PNG)),
            )),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert!(recipe.id.starts_with("R_"));
        assert_eq!(recipe.name, "Pancakes");
        assert_eq!(recipe.cooking_time, 20);
        assert_eq!(recipe.author.username, "chef");
        assert!(!recipe.is_favorited);
        assert!(!recipe.is_in_shopping_cart);
        assert!(recipe.image.starts_with("/api/media/recipes/recipe_"));
        assert!(recipe.pub_date.is_some());

        // Ingredients come back joined with catalog data, sorted by name
        assert_eq!(recipe.ingredients.len(), 2);
        assert_eq!(recipe.ingredients[0].name, "egg");
        assert_eq!(recipe.ingredients[0].amount, 2);
        assert_eq!(recipe.ingredients[1].name, "flour");
        assert_eq!(recipe.ingredients[1].amount, 200);
        assert_eq!(recipe.ingredients[1].measurement_unit, "g");

        let junction_rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recipe_ingredients")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(junction_rows, 2);
    }

    #[tokio::test]
    async fn test_create_recipe_requires_image() {
        let pool = setup_test_db().await;
        let author_id = insert_user(&pool, "chef").await;
        let flour = insert_ingredient(&pool, "flour", "g").await;
        let state = test_state(pool);

        let err = crud::create_recipe(
            Extension(state),
            authed(&author_id, "chef"),
            Json(write_payload(vec![(flour.as_str(), 200)], None)),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_create_recipe_rejects_unknown_ingredient() {
        let pool = setup_test_db().await;
        let author_id = insert_user(&pool, "chef").await;
        let state = test_state(pool.clone());

        let err = crud::create_recipe(
            Extension(state),
            authed(&author_id, "chef"),
            Json(write_payload(
                vec![("I_MISSING", 10)],
                Some(TINY_PNG.to_string()),
            )),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recipes")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_list_recipes_orders_newest_first() {
        let pool = setup_test_db().await;
        let author_id = insert_user(&pool, "chef").await;
        insert_recipe(&pool, &author_id, "oldest", "2024-01-01 10:00:00").await;
        insert_recipe(&pool, &author_id, "newest", "2024-03-01 10:00:00").await;
        insert_recipe(&pool, &author_id, "middle", "2024-02-01 10:00:00").await;
        let state = test_state(pool);

        let Json(listing) = crud::list_recipes(
            Extension(state),
            OptionalUser(None),
            Query(RecipeQueryParams::default()),
        )
        .await
        .unwrap();

        assert_eq!(listing.total, 3);
        let names: Vec<&str> = listing.recipes.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["newest", "middle", "oldest"]);

        // Anonymous viewers never see positive flags, and a missing image
        // serializes as an empty string
        assert!(listing.recipes.iter().all(|r| !r.is_favorited));
        assert!(listing.recipes.iter().all(|r| !r.is_in_shopping_cart));
        assert!(listing.recipes.iter().all(|r| !r.author.is_subscribed));
        assert_eq!(listing.recipes[0].image, "");
    }

    #[tokio::test]
    async fn test_list_recipes_pagination_clamps_limit() {
        let pool = setup_test_db().await;
        let author_id = insert_user(&pool, "chef").await;
        for i in 0..8 {
            insert_recipe(
                &pool,
                &author_id,
                &format!("recipe{}", i),
                &format!("2024-01-0{} 10:00:00", i + 1),
            )
            .await;
        }
        let state = test_state(pool);

        let Json(page1) = crud::list_recipes(
            Extension(state.clone()),
            OptionalUser(None),
            Query(RecipeQueryParams::default()),
        )
        .await
        .unwrap();
        assert_eq!(page1.page_size, 6); // default limit
        assert_eq!(page1.recipes.len(), 6);
        assert_eq!(page1.total, 8);

        let Json(page2) = crud::list_recipes(
            Extension(state.clone()),
            OptionalUser(None),
            Query(RecipeQueryParams {
                page: Some(2),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(page2.recipes.len(), 2);

        let Json(clamped) = crud::list_recipes(
            Extension(state),
            OptionalUser(None),
            Query(RecipeQueryParams {
                limit: Some(50),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(clamped.page_size, 30); // requested 50, clamped to 30
    }

    #[tokio::test]
    async fn test_list_recipes_filters() {
        let pool = setup_test_db().await;
        let chef_id = insert_user(&pool, "chef").await;
        let other_id = insert_user(&pool, "other").await;
        let viewer_id = insert_user(&pool, "viewer").await;
        let stew = insert_recipe(&pool, &chef_id, "stew", "2024-01-01 10:00:00").await;
        let cake = insert_recipe(&pool, &other_id, "cake", "2024-01-02 10:00:00").await;
        add_relation(&pool, RelationKind::Favorite, &viewer_id, &stew)
            .await
            .unwrap();
        add_relation(&pool, RelationKind::ShoppingCart, &viewer_id, &cake)
            .await
            .unwrap();
        let state = test_state(pool);

        // author filter
        let Json(by_author) = crud::list_recipes(
            Extension(state.clone()),
            OptionalUser(None),
            Query(RecipeQueryParams {
                author: Some(chef_id.clone()),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(by_author.total, 1);
        assert_eq!(by_author.recipes[0].name, "stew");

        // favorited filter for an authenticated viewer
        let Json(favorited) = crud::list_recipes(
            Extension(state.clone()),
            OptionalUser(Some(authed(&viewer_id, "viewer"))),
            Query(RecipeQueryParams {
                is_favorited: Some("1".to_string()),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(favorited.total, 1);
        assert_eq!(favorited.recipes[0].name, "stew");
        assert!(favorited.recipes[0].is_favorited);

        // cart filter for an authenticated viewer
        let Json(carted) = crud::list_recipes(
            Extension(state.clone()),
            OptionalUser(Some(authed(&viewer_id, "viewer"))),
            Query(RecipeQueryParams {
                is_in_shopping_cart: Some("1".to_string()),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(carted.total, 1);
        assert_eq!(carted.recipes[0].name, "cake");

        // The relation filters are ignored for anonymous requesters
        let Json(anonymous) = crud::list_recipes(
            Extension(state),
            OptionalUser(None),
            Query(RecipeQueryParams {
                is_favorited: Some("1".to_string()),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(anonymous.total, 2);
    }

    #[tokio::test]
    async fn test_get_recipe_stamps_viewer_flags() {
        let pool = setup_test_db().await;
        let chef_id = insert_user(&pool, "chef").await;
        let viewer_id = insert_user(&pool, "viewer").await;
        let recipe_id = insert_recipe(&pool, &chef_id, "stew", "2024-01-01 10:00:00").await;
        add_relation(&pool, RelationKind::Favorite, &viewer_id, &recipe_id)
            .await
            .unwrap();
        add_relation(&pool, RelationKind::Subscription, &viewer_id, &chef_id)
            .await
            .unwrap();
        let state = test_state(pool);

        let Json(seen) = crud::get_recipe(
            Extension(state.clone()),
            OptionalUser(Some(authed(&viewer_id, "viewer"))),
            Path(recipe_id.clone()),
        )
        .await
        .unwrap();
        assert!(seen.is_favorited);
        assert!(!seen.is_in_shopping_cart);
        assert!(seen.author.is_subscribed);

        let Json(anon) = crud::get_recipe(
            Extension(state.clone()),
            OptionalUser(None),
            Path(recipe_id),
        )
        .await
        .unwrap();
        assert!(!anon.is_favorited);
        assert!(!anon.author.is_subscribed);

        let err = crud::get_recipe(
            Extension(state),
            OptionalUser(None),
            Path("R_MISSING".to_string()),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_recipe_replaces_ingredient_set() {
        let pool = setup_test_db().await;
        let author_id = insert_user(&pool, "chef").await;
        let flour = insert_ingredient(&pool, "flour", "g").await;
        let egg = insert_ingredient(&pool, "egg", "pcs").await;
        let sugar = insert_ingredient(&pool, "sugar", "g").await;
        let recipe_id = insert_recipe(&pool, &author_id, "stew", "2024-01-01 10:00:00").await;
        link_ingredient(&pool, &recipe_id, &flour, 200).await;
        link_ingredient(&pool, &recipe_id, &egg, 2).await;
        let state = test_state(pool.clone());

        let mut payload = write_payload(vec![(sugar.as_str(), 50)], None);
        payload.name = "Sweet stew".to_string();
        payload.cooking_time = 45;

        let Json(updated) = crud::update_recipe(
            Extension(state),
            authed(&author_id, "chef"),
            Path(recipe_id.clone()),
            Json(payload),
        )
        .await
        .unwrap();

        assert_eq!(updated.name, "Sweet stew");
        assert_eq!(updated.cooking_time, 45);

        // The prior ingredient set is gone, replaced wholesale
        assert_eq!(updated.ingredients.len(), 1);
        assert_eq!(updated.ingredients[0].name, "sugar");

        let junction_rows: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM recipe_ingredients WHERE recipe_id = ?")
                .bind(&recipe_id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(junction_rows, 1);
    }

    #[tokio::test]
    async fn test_update_recipe_keeps_image_when_absent() {
        let pool = setup_test_db().await;
        let author_id = insert_user(&pool, "chef").await;
        let flour = insert_ingredient(&pool, "flour", "g").await;
        let recipe_id = insert_recipe(&pool, &author_id, "stew", "2024-01-01 10:00:00").await;
        sqlx::query("UPDATE recipes SET image = 'existing.png' WHERE id = ?")
            .bind(&recipe_id)
            .execute(&pool)
            .await
            .unwrap();
        let state = test_state(pool.clone());

        crud::update_recipe(
            Extension(state),
            authed(&author_id, "chef"),
            Path(recipe_id.clone()),
            Json(write_payload(vec![(flour.as_str(), 100)], None)),
        )
        .await
        .unwrap();

        let stored: Option<String> = sqlx::query_scalar("SELECT image FROM recipes WHERE id = ?")
            .bind(&recipe_id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(stored.as_deref(), Some("existing.png"));
    }

    #[tokio::test]
    async fn test_update_recipe_rejects_non_author() {
        let pool = setup_test_db().await;
        let author_id = insert_user(&pool, "chef").await;
        let intruder_id = insert_user(&pool, "intruder").await;
        let flour = insert_ingredient(&pool, "flour", "g").await;
        let recipe_id = insert_recipe(&pool, &author_id, "stew", "2024-01-01 10:00:00").await;
        let state = test_state(pool);

        let err = crud::update_recipe(
            Extension(state),
            authed(&intruder_id, "intruder"),
            Path(recipe_id),
            Json(write_payload(vec![(flour.as_str(), 100)], None)),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_delete_recipe_cascades_relations() {
        let pool = setup_test_db().await;
        let author_id = insert_user(&pool, "chef").await;
        let fan_id = insert_user(&pool, "fan").await;
        let flour = insert_ingredient(&pool, "flour", "g").await;
        let recipe_id = insert_recipe(&pool, &author_id, "stew", "2024-01-01 10:00:00").await;
        link_ingredient(&pool, &recipe_id, &flour, 200).await;
        add_relation(&pool, RelationKind::Favorite, &fan_id, &recipe_id)
            .await
            .unwrap();
        add_relation(&pool, RelationKind::ShoppingCart, &fan_id, &recipe_id)
            .await
            .unwrap();
        let state = test_state(pool.clone());

        let status = crud::delete_recipe(
            Extension(state),
            authed(&author_id, "chef"),
            Path(recipe_id.clone()),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        for table in ["recipes", "recipe_ingredients", "favorites", "shopping_cart"] {
            let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
                .fetch_one(&pool)
                .await
                .unwrap();
            assert_eq!(count, 0, "{} should be empty after cascade", table);
        }
    }

    #[tokio::test]
    async fn test_delete_recipe_rejects_non_author() {
        let pool = setup_test_db().await;
        let author_id = insert_user(&pool, "chef").await;
        let intruder_id = insert_user(&pool, "intruder").await;
        let recipe_id = insert_recipe(&pool, &author_id, "stew", "2024-01-01 10:00:00").await;
        let state = test_state(pool.clone());

        let err = crud::delete_recipe(
            Extension(state),
            authed(&intruder_id, "intruder"),
            Path(recipe_id),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recipes")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    // ========================================================================
    // Relation Toggle Handler Tests
    // ========================================================================

    #[tokio::test]
    async fn test_favorite_toggle_cycle() {
        let pool = setup_test_db().await;
        let chef_id = insert_user(&pool, "chef").await;
        let fan_id = insert_user(&pool, "fan").await;
        let recipe_id = insert_recipe(&pool, &chef_id, "stew", "2024-01-01 10:00:00").await;
        let state = test_state(pool.clone());

        let (status, Json(short)) = relations::favorite_recipe(
            Extension(state.clone()),
            authed(&fan_id, "fan"),
            Path(recipe_id.clone()),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(short.id, recipe_id);
        assert_eq!(short.name, "stew");
        assert_eq!(short.image, "");
        assert_eq!(short.cooking_time, 10);

        // Favoriting twice reports a conflict and leaves exactly one row
        let err = relations::favorite_recipe(
            Extension(state.clone()),
            authed(&fan_id, "fan"),
            Path(recipe_id.clone()),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM favorites")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);

        let status = relations::unfavorite_recipe(
            Extension(state.clone()),
            authed(&fan_id, "fan"),
            Path(recipe_id.clone()),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        // Removing a never-added relation is a conflict, not a server error
        let err = relations::unfavorite_recipe(
            Extension(state),
            authed(&fan_id, "fan"),
            Path(recipe_id),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_shopping_cart_toggle_and_missing_recipe() {
        let pool = setup_test_db().await;
        let chef_id = insert_user(&pool, "chef").await;
        let fan_id = insert_user(&pool, "fan").await;
        let recipe_id = insert_recipe(&pool, &chef_id, "stew", "2024-01-01 10:00:00").await;
        let state = test_state(pool);

        let (status, Json(short)) = relations::add_to_shopping_cart(
            Extension(state.clone()),
            authed(&fan_id, "fan"),
            Path(recipe_id.clone()),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(short.id, recipe_id);

        let status = relations::remove_from_shopping_cart(
            Extension(state.clone()),
            authed(&fan_id, "fan"),
            Path(recipe_id),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        // A missing recipe is a 404 ahead of any relation outcome
        let err = relations::add_to_shopping_cart(
            Extension(state.clone()),
            authed(&fan_id, "fan"),
            Path("R_MISSING".to_string()),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));

        let err = relations::remove_from_shopping_cart(
            Extension(state),
            authed(&fan_id, "fan"),
            Path("R_MISSING".to_string()),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    // ========================================================================
    // Shopping List Tests
    // ========================================================================

    #[tokio::test]
    async fn test_aggregation_sums_across_recipes() {
        let pool = setup_test_db().await;
        let chef_id = insert_user(&pool, "chef").await;
        let flour = insert_ingredient(&pool, "flour", "g").await;
        let egg = insert_ingredient(&pool, "egg", "pcs").await;
        let sugar = insert_ingredient(&pool, "sugar", "g").await;

        // Recipe A: flour 200 + egg 2; recipe B: flour 100 + sugar 50
        let recipe_a = insert_recipe(&pool, &chef_id, "A", "2024-01-01 10:00:00").await;
        link_ingredient(&pool, &recipe_a, &flour, 200).await;
        link_ingredient(&pool, &recipe_a, &egg, 2).await;
        let recipe_b = insert_recipe(&pool, &chef_id, "B", "2024-01-02 10:00:00").await;
        link_ingredient(&pool, &recipe_b, &flour, 100).await;
        link_ingredient(&pool, &recipe_b, &sugar, 50).await;

        add_relation(&pool, RelationKind::ShoppingCart, &chef_id, &recipe_a)
            .await
            .unwrap();
        add_relation(&pool, RelationKind::ShoppingCart, &chef_id, &recipe_b)
            .await
            .unwrap();
        let state_lock = test_state(pool.clone());
        let state = state_lock.read().await.clone();

        let items = shopping_list::aggregate_cart_ingredients(&state, &chef_id)
            .await
            .unwrap();

        // egg 2, flour 300, sugar 50 in alphabetical order
        assert_eq!(items.len(), 3);
        assert_eq!((items[0].name.as_str(), items[0].total), ("egg", 2));
        assert_eq!((items[1].name.as_str(), items[1].total), ("flour", 300));
        assert_eq!((items[2].name.as_str(), items[2].total), ("sugar", 50));

        // Insertion order does not change the aggregate
        let other_id = insert_user(&pool, "other").await;
        add_relation(&pool, RelationKind::ShoppingCart, &other_id, &recipe_b)
            .await
            .unwrap();
        add_relation(&pool, RelationKind::ShoppingCart, &other_id, &recipe_a)
            .await
            .unwrap();
        let reversed = shopping_list::aggregate_cart_ingredients(&state, &other_id)
            .await
            .unwrap();
        assert_eq!(reversed.len(), 3);
        assert_eq!((reversed[1].name.as_str(), reversed[1].total), ("flour", 300));
    }

    #[test]
    fn test_render_shopping_list_format() {
        let user = User {
            id: "U_TEST00".to_string(),
            email: "ada@example.com".to_string(),
            username: "ada".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            password_hash: "x".to_string(),
            avatar: None,
            created_at: None,
        };
        let items = vec![
            shopping_list::AggregatedIngredient {
                name: "flour".to_string(),
                measurement_unit: "g".to_string(),
                total: 300,
            },
            shopping_list::AggregatedIngredient {
                name: "sugar".to_string(),
                measurement_unit: "g".to_string(),
                total: 50,
            },
        ];
        let recipes = vec![shopping_list::CartRecipe {
            name: "Pancakes".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
        }];
        let now = Utc.with_ymd_and_hms(2025, 3, 14, 12, 0, 0).unwrap();

        let rendered = shopping_list::render_shopping_list(&user, &items, &recipes, now);

        let expected = "Shopping list for Ada Lovelace\n\
                        Date: 14-03-2025\n\
                        \n\
                        Ingredients:\n\
                        1. Flour (g) - 300\n\
                        2. Sugar (g) - 50\n\
                        \n\
                        Recipes:\n\
                        - Pancakes (@ Ada Lovelace)\n\
                        \n\
                        Recipebook (2025)";
        assert_eq!(rendered, expected);
    }

    #[tokio::test]
    async fn test_download_shopping_cart_empty_is_rejected() {
        let pool = setup_test_db().await;
        let user_id = insert_user(&pool, "ada").await;
        let state = test_state(pool);

        let err =
            shopping_list::download_shopping_cart(Extension(state), authed(&user_id, "ada"))
                .await
                .unwrap_err();
        match err {
            ApiError::BadRequest(msg) => assert_eq!(msg, "shopping cart is empty"),
            other => panic!("expected BadRequest, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_download_shopping_cart_headers() {
        let pool = setup_test_db().await;
        let user_id = insert_user(&pool, "ada").await;
        let flour = insert_ingredient(&pool, "flour", "g").await;
        let recipe_id = insert_recipe(&pool, &user_id, "stew", "2024-01-01 10:00:00").await;
        link_ingredient(&pool, &recipe_id, &flour, 200).await;
        add_relation(&pool, RelationKind::ShoppingCart, &user_id, &recipe_id)
            .await
            .unwrap();
        let state = test_state(pool);

        let response =
            shopping_list::download_shopping_cart(Extension(state), authed(&user_id, "ada"))
                .await
                .unwrap()
                .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("Content-Type").unwrap(),
            "text/plain; charset=utf-8"
        );
        assert_eq!(
            response.headers().get("Content-Disposition").unwrap(),
            "attachment; filename=\"ada_shopping_list.txt\""
        );
    }

    // ========================================================================
    // Short Link Tests
    // ========================================================================

    #[tokio::test]
    async fn test_get_short_link_shape() {
        let pool = setup_test_db().await;
        let chef_id = insert_user(&pool, "chef").await;
        let recipe_id = insert_recipe(&pool, &chef_id, "stew", "2024-01-01 10:00:00").await;
        let state = test_state(pool);

        let Json(link) = links::get_short_link(Extension(state.clone()), Path(recipe_id.clone()))
            .await
            .unwrap();
        assert_eq!(
            link.short_link,
            format!("http://localhost:8080/s/{}", recipe_id)
        );

        // The JSON field is hyphenated
        let value = serde_json::to_value(&link).unwrap();
        assert!(value.get("short-link").is_some());

        let err = links::get_short_link(Extension(state), Path("R_MISSING".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_resolve_short_link_redirects() {
        let pool = setup_test_db().await;
        let chef_id = insert_user(&pool, "chef").await;
        let recipe_id = insert_recipe(&pool, &chef_id, "stew", "2024-01-01 10:00:00").await;
        let state = test_state(pool);

        let response = links::resolve_short_link(Extension(state.clone()), Path(recipe_id.clone()))
            .await
            .unwrap()
            .into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get("Location").unwrap(),
            &format!("/recipes/{}", recipe_id)
        );

        let err = links::resolve_short_link(Extension(state), Path("R_MISSING".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
