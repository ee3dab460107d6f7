//! Seed the catalog with sample categories and products.
//!
//! Intended for local development: gives a fresh database a browsable
//! catalog without going through the API. Inserts are keyed on slug and
//! skipped when the row already exists, so the command is safe to re-run.

use rust_decimal::Decimal;
use tracing::info;

use nixe_core::slugify;

use super::CommandError;

struct SeedCategory {
    name_fr: &'static str,
    name_en: Option<&'static str>,
    is_occasion: bool,
}

struct SeedProduct {
    title_fr: &'static str,
    title_en: Option<&'static str>,
    category: &'static str,
    price: Decimal,
    description_fr: &'static str,
}

const CATEGORIES: &[SeedCategory] = &[
    SeedCategory {
        name_fr: "Planches de surf",
        name_en: Some("Surfboards"),
        is_occasion: false,
    },
    SeedCategory {
        name_fr: "Combinaisons",
        name_en: Some("Wetsuits"),
        is_occasion: false,
    },
    SeedCategory {
        name_fr: "Accessoires",
        name_en: Some("Accessories"),
        is_occasion: false,
    },
    SeedCategory {
        name_fr: "Occasions",
        name_en: Some("Second hand"),
        is_occasion: true,
    },
];

fn products() -> Vec<SeedProduct> {
    vec![
        SeedProduct {
            title_fr: "Longboard 9'1 Nixe Classic",
            title_en: Some("Nixe Classic 9'1 Longboard"),
            category: "Planches de surf",
            price: Decimal::new(78_000, 2),
            description_fr: "Longboard polyvalent pour toutes les vagues bretonnes.",
        },
        SeedProduct {
            title_fr: "Shortboard 6'0 Tempete",
            title_en: Some("Tempete 6'0 Shortboard"),
            category: "Planches de surf",
            price: Decimal::new(54_500, 2),
            description_fr: "Shortboard nerveux pour les sessions automnales.",
        },
        SeedProduct {
            title_fr: "Combinaison 4/3 hiver",
            title_en: Some("4/3 winter wetsuit"),
            category: "Combinaisons",
            price: Decimal::new(24_900, 2),
            description_fr: "Neoprene souple, coutures etanches, eau de 10 a 15 degres.",
        },
        SeedProduct {
            title_fr: "Leash 8 pieds",
            title_en: Some("8ft leash"),
            category: "Accessoires",
            price: Decimal::new(3_500, 2),
            description_fr: "Leash renforce pour longboard.",
        },
    ]
}

/// Insert sample categories and products.
pub async fn catalog() -> Result<(), CommandError> {
    let pool = super::connect().await?;

    let mut categories_inserted = 0_u64;
    for category in CATEGORIES {
        let result = sqlx::query(
            "INSERT INTO categories (name_fr, name_en, slug, is_occasion)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (slug) DO NOTHING",
        )
        .bind(category.name_fr)
        .bind(category.name_en)
        .bind(slugify(category.name_fr))
        .bind(category.is_occasion)
        .execute(&pool)
        .await?;
        categories_inserted += result.rows_affected();
    }

    let mut products_inserted = 0_u64;
    for product in products() {
        let result = sqlx::query(
            "INSERT INTO products
                 (title_fr, title_en, slug, price, description_fr, category_id, status)
             SELECT $1, $2, $3, $4, $5, id, 'active'
             FROM categories WHERE name_fr = $6
             ON CONFLICT (slug) DO NOTHING",
        )
        .bind(product.title_fr)
        .bind(product.title_en)
        .bind(slugify(product.title_fr))
        .bind(product.price)
        .bind(product.description_fr)
        .bind(product.category)
        .execute(&pool)
        .await?;
        products_inserted += result.rows_affected();
    }

    info!("Seeding complete!");
    info!("  Categories inserted: {categories_inserted}");
    info!("  Products inserted: {products_inserted}");

    Ok(())
}
