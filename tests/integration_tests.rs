use sovran_typedmap::{Element, ElementType, MapError, MapVariant, TypedMap, Value};
use std::sync::Arc;
use std::thread;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Debug, Clone, PartialEq)]
struct Point {
    x: i64,
    y: i64,
}

impl Element for Point {
    fn interfaces(&self) -> &'static [&'static str] {
        &["PointLike"]
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Label(String);

impl Element for Label {}

// Domain events for the variant tests
#[derive(Debug, Clone, PartialEq)]
struct AccountOpened {
    owner: String,
}

impl Element for AccountOpened {}

#[derive(Debug, Clone, PartialEq)]
struct FundsDeposited {
    amount: u64,
}

impl Element for FundsDeposited {}

struct AccountEvents;

impl MapVariant for AccountEvents {
    const NAME: &'static str = "AccountEvents";

    fn valid_types() -> Vec<ElementType> {
        vec![
            ElementType::of::<AccountOpened>(),
            ElementType::of::<FundsDeposited>(),
        ]
    }
}

struct AuditEvents;

impl MapVariant for AuditEvents {
    const NAME: &'static str = "AuditEvents";

    fn valid_types() -> Vec<ElementType> {
        vec![
            ElementType::of::<AccountOpened>(),
            ElementType::of::<FundsDeposited>(),
        ]
    }
}

fn point_like() -> [ElementType; 1] {
    [ElementType::interface("PointLike")]
}

#[test]
fn test_get_returns_equal_but_distinct_value() -> Result<(), MapError> {
    init_logging();
    let original = Point { x: 1, y: 1 };
    let map = TypedMap::new([("a", original.clone())], point_like())?;

    let fetched = map.get_as::<Point>("a")?;
    assert_eq!(fetched, original);
    assert!(!std::ptr::eq(
        map.raw()?.get("a").and_then(|value| value.downcast_ref::<Point>()).unwrap(),
        &original
    ));
    Ok(())
}

#[test]
fn test_caller_mutation_does_not_reach_the_map() -> Result<(), MapError> {
    init_logging();
    let mut point = Point { x: 1, y: 1 };
    let map = TypedMap::from_types(point_like())?.with("p", point.clone())?;

    // The caller's object changes after insertion
    point.x = 100;
    assert_eq!(map.get_as::<Point>("p")?, Point { x: 1, y: 1 });

    // A retrieved copy changes after retrieval
    let mut copy = map.get("p")?;
    copy.downcast_mut::<Point>().unwrap().y = 100;
    assert_eq!(map.get_as::<Point>("p")?, Point { x: 1, y: 1 });
    Ok(())
}

#[test]
fn test_invalid_value_leaves_no_trace() -> Result<(), MapError> {
    init_logging();
    let map = TypedMap::new([("a", Point { x: 1, y: 1 })], point_like())?;

    match map.with("x", "not-a-point") {
        Err(MapError::InvalidType { key, found, expected }) => {
            assert_eq!(key, "x");
            assert_eq!(found, "&str");
            assert_eq!(expected, "PointLike");
        }
        other => panic!("Expected InvalidType, got {:?}", other),
    }
    assert!(!map.has("x")?);
    assert_eq!(map.keys()?, vec!["a"]);
    Ok(())
}

#[test]
fn test_derived_maps_are_independent() -> Result<(), MapError> {
    init_logging();
    let m1 = TypedMap::from_types(point_like())?;
    let m2 = m1.with("b", Point { x: 2, y: 2 })?;

    assert!(!m1.has("b")?);
    assert!(m2.has("b")?);

    let m3 = m2.with("c", Point { x: 3, y: 3 })?;
    assert_eq!(m2.keys()?, vec!["b"]);
    assert_eq!(m3.keys()?, vec!["b", "c"]);
    Ok(())
}

#[test]
fn test_mixed_permitted_types() -> Result<(), MapError> {
    init_logging();
    let map = TypedMap::new(
        vec![
            ("origin", Value::new(Point { x: 0, y: 0 })),
            ("name", Value::new(Label("home".to_string()))),
        ],
        [ElementType::interface("PointLike"), ElementType::of::<Label>()],
    )?;

    assert_eq!(map.get_as::<Label>("name")?, Label("home".to_string()));
    assert!(map.with("count", 3u8).is_err());

    // Reading back as the wrong type is a mismatch, not a missing key
    match map.get_as::<Label>("origin") {
        Err(MapError::TypeMismatch { found, .. }) => assert!(found.ends_with("Point")),
        other => panic!("Expected TypeMismatch, got {:?}", other),
    }
    Ok(())
}

#[test]
fn test_predicate_permitted_type() -> Result<(), MapError> {
    init_logging();
    let positive = ElementType::predicate("PositiveInt", |value: &Value| {
        value.downcast_ref::<i64>().map_or(false, |n| *n > 0)
    });
    let map = TypedMap::new([("a", 1i64)], [positive])?;

    assert!(map.with("b", 2i64).is_ok());
    assert!(matches!(
        map.with("c", -2i64),
        Err(MapError::InvalidType { .. })
    ));
    assert!(matches!(
        map.map(|value| value.downcast::<i64>().map_or(0, |n| -n)),
        Err(MapError::InvalidType { .. })
    ));
    Ok(())
}

#[test]
fn test_variants() -> Result<(), MapError> {
    init_logging();
    let events = TypedMap::of_variant::<AccountEvents, _, _, _>(vec![
        (
            "0001",
            Value::new(AccountOpened {
                owner: "ada".to_string(),
            }),
        ),
        ("0002", Value::new(FundsDeposited { amount: 50 })),
    ])?;

    assert_eq!(events.variant()?, Some("AccountEvents"));
    assert_eq!(events.empty()?.variant()?, Some("AccountEvents"));

    let later = TypedMap::of_variant::<AccountEvents, _, _, _>([(
        "0003",
        FundsDeposited { amount: 25 },
    )])?;
    let all = events.merge(&later)?;
    assert_eq!(all.keys()?, vec!["0001", "0002", "0003"]);

    let deposited: u64 = all.reduce(0, |total, _, event| {
        total + event.downcast_ref::<FundsDeposited>().map_or(0, |e| e.amount)
    })?;
    assert_eq!(deposited, 75);

    // Same permitted types, different variant
    let audit = TypedMap::of_variant::<AuditEvents, _, _, _>([(
        "0003",
        FundsDeposited { amount: 25 },
    )])?;
    match events.merge(&audit) {
        Err(MapError::IncompatibleMaps { left, right }) => {
            assert!(left.starts_with("AccountEvents ["));
            assert!(right.starts_with("AuditEvents ["));
        }
        other => panic!("Expected IncompatibleMaps, got {:?}", other),
    }

    // An unnamed map is not an instance of the variant either
    let unnamed = TypedMap::new(
        [("0004", FundsDeposited { amount: 1 })],
        AccountEvents::valid_types(),
    )?;
    assert!(events.diff(&unnamed).is_err());
    Ok(())
}

#[test]
fn test_binary_operation_with_uninitialized_argument() -> Result<(), MapError> {
    let map = TypedMap::new([("a", 1i32)], [ElementType::of::<i32>()])?;
    assert_eq!(map.merge(&TypedMap::uninit()), Err(MapError::Uninitialized));
    Ok(())
}

#[test]
fn test_maps_are_shareable_across_threads() -> Result<(), MapError> {
    init_logging();
    let base = Arc::new(TypedMap::new([("seed", 0u64)], [ElementType::of::<u64>()])?);

    let handles: Vec<_> = (1..=4u64)
        .map(|n| {
            let base = Arc::clone(&base);
            thread::spawn(move || base.with(format!("worker{}", n), n))
        })
        .collect();

    for handle in handles {
        let derived = handle.join().expect("worker panicked")?;
        assert_eq!(derived.count()?, 2);
    }
    assert_eq!(base.keys()?, vec!["seed"]);
    Ok(())
}
