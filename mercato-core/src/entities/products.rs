use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use rust_decimal::Decimal;

/// The catalog fields an order snapshots at creation time.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ProductSnapshot {
    pub product_id: String,
    pub name: String,
    pub price: Decimal,
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
/// Look up a product's current price, name and image.
pub struct GetProductById {
    pub product_id: String,
}

impl Processor<GetProductById> for DatabaseProcessor {
    type Output = Option<ProductSnapshot>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetProductById")]
    async fn process(&self, query: GetProductById) -> Result<Option<ProductSnapshot>, sqlx::Error> {
        let product = sqlx::query_as::<_, ProductSnapshot>(
            r#"
            SELECT product_id, name, price, image
            FROM products
            WHERE product_id = $1
            "#,
        )
        .bind(query.product_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }
}
