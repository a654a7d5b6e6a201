use std::sync::Arc;

use paystream::prelude::*;
use paystream_pay::PriceClient;
use paystream_test_utils::Paywall;
use rstest::*;

use crate::common::{TRACK, track};

#[rstest]
#[case::per_mib(UnitPrice::per_mib(1000))]
#[case::custom_unit(UnitPrice::new(7, 1000, 2).unwrap())]
#[tokio::test]
async fn quote_matches_paywall(#[case] price: UnitPrice) {
    let server = Paywall::new(TRACK, track(10)).with_price(price).start().await;
    let client = PriceClient::new(
        Arc::new(HttpClient::new(NetOptions::default()).unwrap()),
        server.base_url().clone(),
    );

    let quoted = client.lookup(&ContentKey::new(TRACK).unwrap()).await.unwrap();

    assert_eq!(quoted, price);
}

#[rstest]
#[tokio::test]
async fn unknown_key_is_a_network_error() {
    let server = Paywall::new(TRACK, track(10)).start().await;
    let client = PriceClient::new(
        Arc::new(HttpClient::new(NetOptions::default()).unwrap()),
        server.base_url().clone(),
    );

    let err = client
        .lookup(&ContentKey::new("missing").unwrap())
        .await
        .unwrap_err();

    assert!(matches!(err, PayError::Net(ref e) if e.status_code() == Some(404)));
}
