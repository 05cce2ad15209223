use std::sync::Arc;

use sea_orm::{
    error::SqlErr, ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::product::{self, Entity as Product},
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Input for creating a product.
#[derive(Debug, Clone)]
pub struct CreateProductInput {
    pub gtin: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub manufacturer: Option<String>,
    pub category: Option<String>,
}

/// Fields updatable in place on a product.
#[derive(Debug, Clone, Default)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub manufacturer: Option<String>,
    pub category: Option<String>,
}

/// Service for managing products
#[derive(Clone)]
pub struct ProductService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl ProductService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates a new product. The GTIN, when supplied, must not collide with
    /// an existing product.
    #[instrument(skip(self))]
    pub async fn create_product(
        &self,
        input: CreateProductInput,
    ) -> Result<product::Model, ServiceError> {
        let db = &*self.db_pool;

        if input.name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "name must not be empty".to_string(),
            ));
        }

        if let Some(gtin) = &input.gtin {
            let existing = Product::find()
                .filter(product::Column::Gtin.eq(gtin.clone()))
                .one(db)
                .await?;
            if existing.is_some() {
                return Err(ServiceError::Conflict(format!(
                    "Product with GTIN '{}' already exists",
                    gtin
                )));
            }
        }

        let product_id = Uuid::new_v4();
        let active = product::ActiveModel {
            id: Set(product_id),
            gtin: Set(input.gtin.clone()),
            name: Set(input.name.clone()),
            description: Set(input.description),
            manufacturer: Set(input.manufacturer),
            category: Set(input.category),
            ..Default::default()
        };

        let created = active.insert(db).await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                ServiceError::Conflict("Product with this GTIN already exists".to_string())
            } else {
                ServiceError::from(e)
            }
        })?;

        self.event_sender
            .send(Event::ProductCreated(created.id))
            .await
            .map_err(ServiceError::EventError)?;

        info!(product_id = %created.id, name = %input.name, "Product created");

        Ok(created)
    }

    /// Gets a product by ID
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: Uuid) -> Result<Option<product::Model>, ServiceError> {
        let db = &*self.db_pool;
        let found = Product::find_by_id(id).one(db).await?;
        Ok(found)
    }

    /// Gets a product by its GTIN
    #[instrument(skip(self))]
    pub async fn get_product_by_gtin(
        &self,
        gtin: &str,
    ) -> Result<Option<product::Model>, ServiceError> {
        let db = &*self.db_pool;
        let found = Product::find()
            .filter(product::Column::Gtin.eq(gtin))
            .one(db)
            .await?;
        Ok(found)
    }

    /// Lists products ordered by name.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<product::Model>, ServiceError> {
        let db = &*self.db_pool;
        let rows = Product::find()
            .order_by_asc(product::Column::Name)
            .limit(limit)
            .offset(offset)
            .all(db)
            .await?;
        Ok(rows)
    }

    /// Updates a product in place; absent fields are left untouched.
    #[instrument(skip(self))]
    pub async fn update_product(
        &self,
        id: Uuid,
        input: UpdateProductInput,
    ) -> Result<product::Model, ServiceError> {
        let db = &*self.db_pool;

        let existing = Product::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))?;

        let mut active: product::ActiveModel = existing.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        if let Some(manufacturer) = input.manufacturer {
            active.manufacturer = Set(Some(manufacturer));
        }
        if let Some(category) = input.category {
            active.category = Set(Some(category));
        }

        let updated = active.update(db).await?;

        self.event_sender
            .send(Event::ProductUpdated(updated.id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(updated)
    }
}
