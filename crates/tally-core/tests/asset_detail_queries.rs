//! End-to-end tests for the account-asset and account-detail queries.

mod common;

use std::str::FromStr;

use common::{account, asset, expect_error, expect_success, WorldBuilder};
use rust_decimal::Decimal;
use tally_core::model::DetailRecordId;
use tally_core::permission::{Permission, PermissionSet};
use tally_core::query::{AssetPaginationMeta, DetailPaginationMeta, Query};
use tally_core::response::{codes, ErrorKind, ResponseBody};

fn asset_world(balances: &[(&str, &str)]) -> common::TestWorld {
    let builder = WorldBuilder::new();
    builder
        .add_role("holder", PermissionSet::of(Permission::GetMyAccountAssets))
        .add_account("alice@test", 1, "{}", &["holder"]);
    for (asset_id, amount) in balances {
        builder.add_asset(asset_id, 2);
        builder.add_account_asset("alice@test", asset_id, amount);
    }
    builder.finish()
}

fn assets_query(first_asset_id: Option<&str>, page_size: u64) -> Query {
    Query::GetAccountAssets {
        account_id: account("alice@test"),
        pagination: AssetPaginationMeta {
            page_size,
            first_asset_id: first_asset_id.map(asset),
        },
    }
}

#[test]
fn asset_page_walks_in_asset_id_order() {
    let world = asset_world(&[
        ("cobalt#test", "3"),
        ("argon#test", "1"),
        ("boron#test", "2.50"),
    ]);

    let response = world.execute("alice@test", assets_query(None, 2));
    let ResponseBody::AccountAssets(page) = expect_success(&response) else {
        panic!("expected an account assets response");
    };

    assert_eq!(page.total, 3);
    assert_eq!(page.assets.len(), 2);
    assert_eq!(page.assets[0].asset_id, asset("argon#test"));
    assert_eq!(page.assets[1].asset_id, asset("boron#test"));
    assert_eq!(page.assets[1].amount, Decimal::from_str("2.50").unwrap());
    assert_eq!(page.next_asset_id, Some(asset("cobalt#test")));

    // Resuming from the returned cursor yields the excluded entry first.
    let response = world.execute("alice@test", assets_query(Some("cobalt#test"), 2));
    let ResponseBody::AccountAssets(page) = expect_success(&response) else {
        panic!("expected an account assets response");
    };
    assert_eq!(page.assets.len(), 1);
    assert_eq!(page.assets[0].asset_id, asset("cobalt#test"));
    assert_eq!(page.total, 3);
    assert_eq!(page.next_asset_id, None);
}

#[test]
fn exact_page_has_no_next_cursor() {
    let world = asset_world(&[("argon#test", "1")]);

    let response = world.execute("alice@test", assets_query(None, 1));
    let ResponseBody::AccountAssets(page) = expect_success(&response) else {
        panic!("expected an account assets response");
    };
    assert_eq!(page.assets.len(), 1);
    assert_eq!(page.total, 1);
    assert_eq!(page.next_asset_id, None);
}

#[test]
fn no_balances_is_an_empty_success() {
    let world = asset_world(&[]);

    let response = world.execute("alice@test", assets_query(None, 5));
    let ResponseBody::AccountAssets(page) = expect_success(&response) else {
        panic!("expected an account assets response");
    };
    assert!(page.assets.is_empty());
    assert_eq!(page.total, 0);
    assert_eq!(page.next_asset_id, None);
}

#[test]
fn unknown_asset_cursor_is_a_bad_cursor_error() {
    let world = asset_world(&[("argon#test", "1")]);

    let response = world.execute("alice@test", assets_query(Some("xenon#test"), 5));
    let error = expect_error(&response);
    assert_eq!(error.code, codes::BAD_CURSOR);
    assert!(error.message.contains("xenon#test"));
}

#[test]
fn asset_listing_requires_a_permission() {
    let builder = WorldBuilder::new();
    builder
        .add_role("user", PermissionSet::empty())
        .add_account("alice@test", 1, "{}", &["user"])
        .add_asset("argon#test", 2)
        .add_account_asset("alice@test", "argon#test", "1");
    let world = builder.finish();

    let response = world.execute("alice@test", assets_query(None, 5));
    assert_eq!(expect_error(&response).code, codes::NO_PERMISSION);
}

const ALICE_DETAIL: &str = r#"{
    "alice@test": {"nickname": "al", "title": "dr"},
    "issuer@test": {"kyc": "passed", "tier": "gold"}
}"#;

fn detail_world() -> common::TestWorld {
    let builder = WorldBuilder::new();
    builder
        .add_role("user", PermissionSet::of(Permission::GetMyAccountDetail))
        .add_role("issuer", PermissionSet::empty())
        .add_account("alice@test", 1, ALICE_DETAIL, &["user"])
        .add_account("issuer@test", 1, "{}", &["issuer"]);
    builder.finish()
}

fn detail_query(
    writer: Option<&str>,
    key: Option<&str>,
    pagination: Option<DetailPaginationMeta>,
) -> Query {
    Query::GetAccountDetail {
        account_id: account("alice@test"),
        writer: writer.map(account),
        key: key.map(str::to_string),
        pagination,
    }
}

fn parse_json(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).expect("detail payload is JSON")
}

#[test]
fn whole_detail_map_without_pagination() {
    let world = detail_world();

    let response = world.execute("alice@test", detail_query(None, None, None));
    let ResponseBody::AccountDetail(page) = expect_success(&response) else {
        panic!("expected an account detail response");
    };

    assert_eq!(page.total, 4);
    assert_eq!(page.next_record, None);
    assert_eq!(parse_json(&page.detail), parse_json(ALICE_DETAIL));
}

#[test]
fn writer_filter_selects_one_namespace() {
    let world = detail_world();

    let response = world.execute("alice@test", detail_query(Some("issuer@test"), None, None));
    let ResponseBody::AccountDetail(page) = expect_success(&response) else {
        panic!("expected an account detail response");
    };

    assert_eq!(page.total, 2);
    assert_eq!(
        parse_json(&page.detail),
        parse_json(r#"{"issuer@test": {"kyc": "passed", "tier": "gold"}}"#)
    );
}

#[test]
fn key_filter_selects_across_writers() {
    let world = detail_world();

    let response = world.execute("alice@test", detail_query(None, Some("kyc"), None));
    let ResponseBody::AccountDetail(page) = expect_success(&response) else {
        panic!("expected an account detail response");
    };

    assert_eq!(page.total, 1);
    assert_eq!(
        parse_json(&page.detail),
        parse_json(r#"{"issuer@test": {"kyc": "passed"}}"#)
    );
}

#[test]
fn detail_pages_carry_the_next_record_cursor() {
    let world = detail_world();

    // Records order as (alice, nickname), (alice, title), (issuer, kyc),
    // (issuer, tier); a two-record page ends before (issuer, kyc).
    let response = world.execute(
        "alice@test",
        detail_query(
            None,
            None,
            Some(DetailPaginationMeta {
                page_size: 2,
                first_record: None,
            }),
        ),
    );
    let ResponseBody::AccountDetail(page) = expect_success(&response) else {
        panic!("expected an account detail response");
    };

    assert_eq!(page.total, 4);
    assert_eq!(
        parse_json(&page.detail),
        parse_json(r#"{"alice@test": {"nickname": "al", "title": "dr"}}"#)
    );
    let next = page.next_record.clone().expect("a next record cursor");
    assert_eq!(next.writer, account("issuer@test"));
    assert_eq!(next.key, "kyc");

    // Resume from the cursor.
    let response = world.execute(
        "alice@test",
        detail_query(
            None,
            None,
            Some(DetailPaginationMeta {
                page_size: 2,
                first_record: Some(next),
            }),
        ),
    );
    let ResponseBody::AccountDetail(page) = expect_success(&response) else {
        panic!("expected an account detail response");
    };
    assert_eq!(
        parse_json(&page.detail),
        parse_json(r#"{"issuer@test": {"kyc": "passed", "tier": "gold"}}"#)
    );
    assert_eq!(page.next_record, None);
}

#[test]
fn unknown_detail_cursor_is_a_bad_cursor_error() {
    let world = detail_world();

    let response = world.execute(
        "alice@test",
        detail_query(
            None,
            None,
            Some(DetailPaginationMeta {
                page_size: 2,
                first_record: Some(DetailRecordId {
                    writer: account("nobody@test"),
                    key: "missing".to_string(),
                }),
            }),
        ),
    );
    let error = expect_error(&response);
    assert_eq!(error.code, codes::BAD_CURSOR);
}

#[test]
fn unmatched_filter_on_existing_account_is_an_empty_success() {
    let world = detail_world();

    let response = world.execute(
        "alice@test",
        detail_query(Some("issuer@test"), Some("nickname"), None),
    );
    let ResponseBody::AccountDetail(page) = expect_success(&response) else {
        panic!("expected an account detail response");
    };
    assert_eq!(page.detail, "{}");
    assert_eq!(page.total, 0);
    assert_eq!(page.next_record, None);
}

#[test]
fn absent_account_is_a_no_detail_error() {
    let builder = WorldBuilder::new();
    builder
        .add_role("auditor", PermissionSet::of(Permission::GetAllAccountDetail))
        .add_account("alice@test", 1, "{}", &["auditor"]);
    let world = builder.finish();

    let response = world.execute(
        "alice@test",
        Query::GetAccountDetail {
            account_id: account("ghost@test"),
            writer: None,
            key: None,
            pagination: None,
        },
    );
    let error = expect_error(&response);
    assert_eq!(error.kind, ErrorKind::NoAccountDetail);
    assert_eq!(error.code, 0);
}

#[test]
fn detail_requires_a_permission() {
    let builder = WorldBuilder::new();
    builder
        .add_role("user", PermissionSet::empty())
        .add_account("alice@test", 1, ALICE_DETAIL, &["user"])
        .add_account("bob@test", 1, "{}", &["user"]);
    let world = builder.finish();

    let response = world.execute("bob@test", detail_query(None, None, None));
    let error = expect_error(&response);
    assert_eq!(error.code, codes::NO_PERMISSION);
    assert!(!error.message.contains("nickname"));
}
