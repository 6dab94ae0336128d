//! The storefront's resource lists.

use crate::schema::{FieldDef, ResourceSchema, SortOrder};

pub const CUSTOMERS: &str = "customers";
pub const ORDERS: &str = "orders";
pub const PRODUCTS: &str = "products";
pub const VENDORS: &str = "vendors";
pub const VIP_CUSTOMERS: &str = "vip_customers";

pub fn customers() -> ResourceSchema {
    ResourceSchema::new(
        CUSTOMERS,
        vec![
            FieldDef::text("name").required(),
            FieldDef::text("email").required().email(),
        ],
    )
}

/// Orders reference a customer; the backend enforces that the customer exists.
pub fn orders() -> ResourceSchema {
    ResourceSchema::new(
        ORDERS,
        vec![
            FieldDef::integer("customer_id").required().positive(),
            FieldDef::decimal("total").required().positive(),
        ],
    )
    .with_id_column("orders_id")
}

pub fn products() -> ResourceSchema {
    ResourceSchema::new(
        PRODUCTS,
        vec![
            FieldDef::text("desc").required(),
            FieldDef::decimal("price").required().positive(),
        ],
    )
}

pub fn vendors() -> ResourceSchema {
    ResourceSchema::new(
        VENDORS,
        vec![
            FieldDef::text("name").required(),
            FieldDef::text("contact").required(),
        ],
    )
}

/// VIP customers are listed oldest first and may not share an email.
pub fn vip_customers() -> ResourceSchema {
    ResourceSchema::new(
        VIP_CUSTOMERS,
        vec![
            FieldDef::text("name").required(),
            FieldDef::text("email").required().email().unique(),
        ],
    )
    .ordered_by(SortOrder::ascending("created_at"))
    .with_limit(500)
}

/// All five resource schemas.
pub fn all() -> Vec<ResourceSchema> {
    vec![
        customers(),
        orders(),
        products(),
        vendors(),
        vip_customers(),
    ]
}

/// Look up a resource schema by collection name.
pub fn by_name(name: &str) -> Option<ResourceSchema> {
    all().into_iter().find(|s| s.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Placement;

    #[test]
    fn five_distinct_resources() {
        let names: Vec<_> = all().into_iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            vec!["customers", "orders", "products", "vendors", "vip_customers"]
        );
    }

    #[test]
    fn orders_use_their_own_id_column() {
        let schema = orders();
        assert_eq!(schema.id_column, "orders_id");
        assert_eq!(schema.order, SortOrder::descending("orders_id"));
        assert_eq!(schema.limit, 100);
        assert_eq!(schema.placement(), Placement::Prepend);
    }

    #[test]
    fn vip_customers_are_oldest_first() {
        let schema = vip_customers();
        assert_eq!(schema.order, SortOrder::ascending("created_at"));
        assert_eq!(schema.limit, 500);
        assert_eq!(schema.placement(), Placement::Append);
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(by_name("vendors"), Some(vendors()));
        assert_eq!(by_name("suppliers"), None);
    }
}
