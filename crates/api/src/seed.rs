//! Demo catalog for in-memory runs.

use domain::{Money, Product};

/// Products loaded into the in-memory catalog when no database is configured.
pub fn demo_products() -> Vec<Product> {
    vec![
        Product::new(
            "walnut-desk",
            "Walnut Standing Desk",
            "DESK-WAL-01",
            Money::from_dollars(50),
        )
        .with_inventory(25)
        .with_image("/images/walnut-desk.jpg"),
        Product::new(
            "task-chair",
            "Ergonomic Task Chair",
            "CHAIR-ERG-01",
            Money::from_dollars(30),
        )
        .with_inventory(40)
        .with_image("/images/task-chair.jpg"),
        Product::new(
            "arc-lamp",
            "Arc Floor Lamp",
            "LAMP-ARC-01",
            Money::from_dollars(40),
        )
        .with_inventory(3),
        Product::new("desk-mat", "Felt Desk Mat", "MAT-FLT-01", Money::from_dollars(20))
            .with_inventory(100),
    ]
}
