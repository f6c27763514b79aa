use env_logger::Env;
use sovran_typedmap::{Element, ElementType, MapError, MapVariant, TypedMap, Value};

// Events of a simple shopping cart aggregate
#[derive(Debug, Clone, PartialEq)]
struct ItemAdded {
    sku: String,
    quantity: u32,
}

#[derive(Debug, Clone, PartialEq)]
struct ItemRemoved {
    sku: String,
}

impl Element for ItemAdded {
    fn interfaces(&self) -> &'static [&'static str] {
        &["CartEvent"]
    }
}

impl Element for ItemRemoved {
    fn interfaces(&self) -> &'static [&'static str] {
        &["CartEvent"]
    }
}

struct CartEvents;

impl MapVariant for CartEvents {
    const NAME: &'static str = "CartEvents";

    fn valid_types() -> Vec<ElementType> {
        vec![ElementType::interface("CartEvent")]
    }
}

fn quantity_of(events: &TypedMap, sku: &str) -> Result<u32, MapError> {
    events.reduce(0, |total, _, event| {
        if let Some(added) = event.downcast_ref::<ItemAdded>() {
            if added.sku == sku {
                return total + added.quantity;
            }
        }
        if let Some(removed) = event.downcast_ref::<ItemRemoved>() {
            if removed.sku == sku {
                return 0;
            }
        }
        total
    })
}

fn main() -> Result<(), MapError> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let history = TypedMap::of_variant::<CartEvents, _, _, _>(vec![
        (
            "evt-1",
            Value::new(ItemAdded {
                sku: "apple".to_string(),
                quantity: 2,
            }),
        ),
        (
            "evt-2",
            Value::new(ItemAdded {
                sku: "pear".to_string(),
                quantity: 1,
            }),
        ),
    ])?;

    // Appending an event yields a new history; the old one is still valid
    let updated = history.with(
        "evt-3",
        ItemRemoved {
            sku: "pear".to_string(),
        },
    )?;

    println!("Original history: {:?}", history.keys()?);
    println!("Updated history:  {:?}", updated.keys()?);
    println!("Pears before: {}", quantity_of(&history, "pear")?);
    println!("Pears after:  {}", quantity_of(&updated, "pear")?);

    // Anything that isn't a cart event is refused
    match updated.with("evt-4", "checkout".to_string()) {
        Ok(_) => println!("This shouldn't happen"),
        Err(MapError::InvalidType { found, .. }) => println!("Refused a {}", found),
        Err(e) => println!("Unexpected error: {}", e),
    }

    // Find which event added apples
    let apples = updated.search(|event| {
        event
            .downcast_ref::<ItemAdded>()
            .map_or(false, |added| added.sku == "apple")
    })?;
    println!("Apples were added by {:?}", apples);

    Ok(())
}
