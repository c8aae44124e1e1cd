use std::collections::BTreeSet;

use hearth_loot::{
    EntityTarget, IntRange, LootContext, LootContextParam, LootContextParamSet, LootError,
    LootItemCondition, NumberProvider, ParamValue, ValueCheckCondition, condition::random_chance,
};

fn context_with_kills(kills: i32) -> LootContext {
    LootContext::builder()
        .seed(42)
        .with_param(LootContextParam::ThisEntity, ParamValue::Entity("Steve".into()))
        .with_param(LootContextParam::Origin, ParamValue::Position([0.5, 64.0, 0.5]))
        .with_param(LootContextParam::DamageSource, ParamValue::Named("minecraft:fall".into()))
        .with_param(LootContextParam::KillerEntity, ParamValue::Entity("Zombie".into()))
        .with_score("Steve", "kills", kills)
        .with_score("Zombie", "kills", 4)
        .create(&LootContextParamSet::entity())
        .unwrap()
}

#[test]
fn value_check_tests_the_provider_against_the_range() {
    let condition = ValueCheckCondition::has_value(
        NumberProvider::score(EntityTarget::This, "kills"),
        IntRange::range(2, 5),
    )
    .build();

    assert!(condition.test(&mut context_with_kills(2)));
    assert!(condition.test(&mut context_with_kills(5)));
    assert!(!condition.test(&mut context_with_kills(1)));
    assert!(!condition.test(&mut context_with_kills(6)));
}

#[test]
fn range_bounds_can_read_the_context_too() {
    let condition = ValueCheckCondition::has_value(
        NumberProvider::score(EntityTarget::This, "kills"),
        IntRange {
            min: Some(NumberProvider::score(EntityTarget::Killer, "kills")),
            max: None,
        },
    )
    .build();

    assert_eq!(
        condition.referenced_params(),
        BTreeSet::from([LootContextParam::ThisEntity, LootContextParam::KillerEntity])
    );
    assert!(condition.test(&mut context_with_kills(4)));
    assert!(!condition.test(&mut context_with_kills(3)));

    assert_eq!(condition.validate(&LootContextParamSet::entity()), Ok(()));
    assert_eq!(
        condition.validate(&LootContextParamSet::chest()),
        Err(LootError::ParamNotAllowed {
            param: LootContextParam::KillerEntity,
            set: "chest",
        })
    );
}

#[test]
fn constant_value_check_references_nothing() {
    let condition =
        ValueCheckCondition::has_value(NumberProvider::constant(3.0), IntRange::exact(3)).build();

    assert!(condition.referenced_params().is_empty());
    assert_eq!(condition.validate(&LootContextParamSet::empty()), Ok(()));
    assert!(condition.test(&mut context_with_kills(0)));
}

#[test]
fn builders_compose_inverted_and_alternative_terms() {
    let high = ValueCheckCondition::has_value(
        NumberProvider::score(EntityTarget::This, "kills"),
        IntRange::lower_bound(10),
    );
    let never = random_chance(0.0);

    let condition = high.clone().or(never.clone()).build();
    assert!(matches!(&condition, LootItemCondition::AnyOf { terms } if terms.len() == 2));
    assert!(condition.test(&mut context_with_kills(12)));
    assert!(!condition.test(&mut context_with_kills(9)));

    let inverted = high.invert().build();
    assert!(inverted.test(&mut context_with_kills(9)));
    assert_eq!(inverted.type_name(), "minecraft:inverted");

    let both = never.and(random_chance(1.0)).build();
    assert!(!both.test(&mut context_with_kills(0)));
}

#[test]
fn value_check_reads_from_json() {
    let condition: LootItemCondition = serde_json::from_str(
        r#"{
            "condition": "minecraft:value_check",
            "value": { "type": "minecraft:score", "target": "killer", "score": "kills", "scale": 0.5 },
            "range": { "min": 2, "max": { "type": "minecraft:uniform", "min": 2, "max": 2 } }
        }"#,
    )
    .unwrap();

    let LootItemCondition::ValueCheck(check) = &condition else {
        panic!("expected value_check, got {condition:?}");
    };
    assert_eq!(check.range.min, Some(NumberProvider::constant(2.0)));
    assert_eq!(check.range.max, Some(NumberProvider::uniform(2.0, 2.0)));

    // Zombie has 4 kills, scaled to 2.
    assert!(condition.test(&mut context_with_kills(0)));
}

#[test]
fn exact_ranges_and_constants_are_written_compactly() {
    let condition =
        ValueCheckCondition::has_value(NumberProvider::constant(1.0), IntRange::exact(3)).build();

    let json = serde_json::to_value(&condition).unwrap();
    assert_eq!(json["condition"], "minecraft:value_check");
    assert_eq!(json["value"], 1.0);
    assert_eq!(json["range"], 3);

    let open = serde_json::to_value(IntRange::upper_bound(7)).unwrap();
    assert_eq!(open, serde_json::json!({ "max": 7.0 }));
}

#[test]
fn conditions_read_from_toml_without_namespaces() {
    #[derive(serde::Deserialize)]
    struct Pool {
        conditions: Vec<LootItemCondition>,
    }

    let pool: Pool = toml::from_str(
        r#"
        [[conditions]]
        condition = "value_check"
        value = 5
        range = 5

        [[conditions]]
        condition = "inverted"
        term = { condition = "random_chance", chance = 0.0 }
        "#,
    )
    .unwrap();

    assert_eq!(pool.conditions.len(), 2);
    let mut context = context_with_kills(0);
    assert!(pool.conditions.iter().all(|condition| condition.test(&mut context)));
}
