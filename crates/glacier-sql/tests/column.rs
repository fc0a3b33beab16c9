use glacier_sql::{ClientType, ColumnInfo};
use serde_json::json;

#[test]
fn descriptor_with_client_type_round_trips_over_the_wire() {
    let column = ColumnInfo::new("t", "c", "long").with_client_type(ClientType::BigInt, 20);

    let decoded = ColumnInfo::from_wire(&column.to_wire()).expect("descriptor decodes");

    assert_eq!(decoded, column);
    assert_eq!(decoded.table(), "t");
    assert_eq!(decoded.name(), "c");
    assert_eq!(decoded.engine_type(), "long");
    assert_eq!(decoded.client_type().map(ClientType::code), Some(-5));
    assert_eq!(decoded.display_size(), 20);
}

#[test]
fn descriptor_without_table_or_client_type_omits_them() {
    let column = ColumnInfo::new("", "c2", "text");

    let value = column.to_json().expect("descriptor encodes");
    assert_eq!(value, json!({ "name": "c2", "type": "text" }));
    assert_eq!(value.to_string(), r#"{"name":"c2","type":"text"}"#);

    assert_eq!(
        ColumnInfo::from_json(value).expect("descriptor decodes"),
        column
    );
}

#[test]
fn display_size_without_client_type_is_dropped() {
    let value = json!({ "name": "c", "type": "text", "display_size": 12 });

    let decoded = ColumnInfo::from_json(value).expect("descriptor decodes");

    assert_eq!(decoded.client_type(), None);
    assert_eq!(decoded.display_size(), 0);
    assert_eq!(decoded, ColumnInfo::new("", "c", "text"));
    assert_eq!(
        decoded.to_json().expect("descriptor encodes"),
        json!({ "name": "c", "type": "text" })
    );
}

mod property {
    use glacier_sql::{ClientType, ColumnInfo};
    use proptest::prelude::*;

    fn arb_column() -> impl Strategy<Value = ColumnInfo> {
        (
            "[a-z_]{0,6}",
            "[a-z_]{1,6}",
            "[a-z]{1,8}",
            prop::option::of((prop::sample::select(ClientType::ALL), any::<u32>())),
        )
            .prop_map(|(table, name, engine_type, client)| {
                let column = ColumnInfo::new(table, name, engine_type);
                match client {
                    Some((client_type, display_size)) => {
                        column.with_client_type(client_type, display_size)
                    }
                    None => column,
                }
            })
    }

    proptest! {
        #[test]
        fn wire_round_trip_is_lossless(column in arb_column()) {
            let decoded = ColumnInfo::from_wire(&column.to_wire()).expect("descriptor decodes");
            prop_assert_eq!(decoded, column);
        }

        #[test]
        fn declarative_round_trip_is_lossless(column in arb_column()) {
            let value = column.to_json().expect("descriptor encodes");
            prop_assert_eq!(value.get("table").is_none(), column.table().is_empty());
            prop_assert_eq!(value.get("jdbc_type").is_none(), value.get("display_size").is_none());

            let decoded = ColumnInfo::from_json(value).expect("descriptor decodes");
            prop_assert_eq!(decoded, column);
        }
    }
}
