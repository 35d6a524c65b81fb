use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crossdock_core::{DomainError, Entity, EntityId, OrgId};

/// Product identifier (org-scoped via the `org_id` field on the entity).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub EntityId);

impl ProductId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl core::str::FromStr for ProductId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Product status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    Active,
    Archived,
}

/// Mutable product attributes, edited independently of the product's identity.
///
/// Prices are in the smallest currency unit (e.g., cents).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductAttributes {
    pub name: String,
    pub sku: String,
    pub barcode: Option<String>,
    pub category: String,
    pub selling_price: u64,
    pub unit_cost: u64,
    /// Quantity at or below which the product shows up in low-stock views.
    pub reorder_threshold: i64,
    pub expires_on: Option<NaiveDate>,
}

impl ProductAttributes {
    fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }
        if self.sku.trim().is_empty() {
            return Err(DomainError::validation("sku cannot be empty"));
        }
        if self.reorder_threshold < 0 {
            return Err(DomainError::validation(
                "reorder_threshold cannot be negative",
            ));
        }
        Ok(())
    }
}

/// Entity: Product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub org_id: OrgId,
    pub status: ProductStatus,
    pub attributes: ProductAttributes,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn new(
        id: ProductId,
        org_id: OrgId,
        attributes: ProductAttributes,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        attributes.validate()?;
        Ok(Self {
            id,
            org_id,
            status: ProductStatus::Active,
            attributes,
            created_at,
        })
    }

    /// Replace the mutable attribute set. Identity and status are untouched.
    pub fn update_attributes(&mut self, attributes: ProductAttributes) -> Result<(), DomainError> {
        attributes.validate()?;
        self.attributes = attributes;
        Ok(())
    }

    pub fn archive(&mut self) -> Result<(), DomainError> {
        if self.status == ProductStatus::Archived {
            return Err(DomainError::invariant("product is already archived"));
        }
        self.status = ProductStatus::Archived;
        Ok(())
    }

    pub fn can_be_sold(&self) -> bool {
        self.status == ProductStatus::Active
    }

    /// Whether a reconciled quantity sits at or below the reorder threshold.
    pub fn is_low_stock(&self, quantity: i64) -> bool {
        quantity <= self.attributes.reorder_threshold
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs() -> ProductAttributes {
        ProductAttributes {
            name: "Espresso Beans 1kg".to_string(),
            sku: "ESP-1KG".to_string(),
            barcode: Some("4006381333931".to_string()),
            category: "coffee".to_string(),
            selling_price: 1899,
            unit_cost: 950,
            reorder_threshold: 5,
            expires_on: None,
        }
    }

    fn product() -> Product {
        Product::new(
            ProductId::new(EntityId::new()),
            OrgId::new(),
            attrs(),
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn rejects_blank_sku() {
        let mut a = attrs();
        a.sku = "".to_string();
        let err = Product::new(ProductId::new(EntityId::new()), OrgId::new(), a, Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn update_attributes_keeps_identity() {
        let mut p = product();
        let id = p.id;

        let mut a = attrs();
        a.selling_price = 2099;
        p.update_attributes(a).unwrap();

        assert_eq!(p.id, id);
        assert_eq!(p.attributes.selling_price, 2099);
    }

    #[test]
    fn archive_is_not_repeatable() {
        let mut p = product();
        p.archive().unwrap();
        assert!(!p.can_be_sold());

        let err = p.archive().unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn low_stock_compares_against_threshold() {
        let p = product();
        assert!(p.is_low_stock(5));
        assert!(p.is_low_stock(-2));
        assert!(!p.is_low_stock(6));
    }
}
