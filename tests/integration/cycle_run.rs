//! End-to-end calculation runs against in-memory sources.
//!
//! Drives the full runner (concurrent gather, selection, leg arithmetic,
//! report formatting) without touching the network.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::TimeZone;
    use tokio_test::{assert_err, assert_ok};

    use crate::mock_sources::{MockQuotes, MockRates};
    use cycle_arb::engine::{
        ClosingRate, CycleCalculator, CycleRequest, CycleRunner, RunDefaults, VenueLeg,
        VenueLegRequest,
    };
    use cycle_arb::types::{
        CycleError, Leg, LegConfig, OfficialRate, Pair, Quote, QuoteBook, SelectionRule, Side,
    };
    use cycle_arb::venues::VenueSelection;

    fn calculator() -> CycleCalculator {
        CycleCalculator::new(chrono_tz::America::Argentina::Buenos_Aires)
    }

    fn runner(quotes: &MockQuotes, rates: &MockRates) -> CycleRunner {
        CycleRunner::new(Arc::new(quotes.clone()), Arc::new(rates.clone()), calculator())
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[tokio::test]
    async fn test_auto_cycle_scenarios_a_b_c() {
        let quotes = MockQuotes::scenario();
        let rates = MockRates::new(Some(1250.0));

        let run = assert_ok!(runner(&quotes, &rates).run(&CycleRequest::default()).await);
        let result = &run.result;

        // A: lowest ask
        assert_eq!(result.usd_to_usdt.venue, "belo");
        assert_eq!(result.usd_to_usdt.rule, Some(SelectionRule::MinAsk));
        assert!(approx(result.usd_to_usdt.amount_out, 1.0));

        // B: highest bid on the default sell side
        assert_eq!(result.usdt_to_ars.venue, "lemoncash");
        assert_eq!(result.usdt_to_ars.side, Some(Side::Sell));
        assert!(approx(result.usdt_to_ars.amount_out, 1215.0));

        // C: closing at the official sell rate
        assert_eq!(result.ars_to_usd.venue, "Oficial");
        assert!(approx(result.final_usd, 0.972));
        assert!(approx(result.profit_percent, -2.8));
        assert!(!result.is_profitable());

        let report = result.to_string();
        assert!(report.contains("[belo] ask 1.000000 → 1.000000 USDT"));
        assert!(report.contains("[lemoncash] sell (bid) 1215.00 → 1215.00 ARS"));
        assert!(report.contains("[Oficial] sell 1250.00 → 0.972000 USD"));
        assert!(report.contains("Profit: -2.80%"));

        assert_eq!(quotes.calls().len(), 2);
        assert_eq!(rates.calls(), 1);
    }

    #[tokio::test]
    async fn test_manual_zero_first_leg_fails_before_fetching() {
        // Scenario D
        let quotes = MockQuotes::scenario();
        let rates = MockRates::new(Some(1250.0));
        let request = CycleRequest {
            usd_usdt: VenueLegRequest::new(LegConfig::manual(0.0)),
            ..Default::default()
        };

        let err = assert_err!(runner(&quotes, &rates).run(&request).await);
        assert!(matches!(err, CycleError::InvalidLegInput { leg: Leg::UsdUsdt, .. }));
        assert!(quotes.calls().is_empty());
        assert_eq!(rates.calls(), 0);
    }

    #[tokio::test]
    async fn test_all_first_leg_venues_disabled() {
        // Scenario E
        let quotes = MockQuotes::scenario();
        let rates = MockRates::new(Some(1250.0));
        let request = CycleRequest {
            usd_usdt: VenueLegRequest::new(LegConfig::auto()).with_venues(Vec::<String>::new()),
            ..Default::default()
        };

        let err = assert_err!(runner(&quotes, &rates).run(&request).await);
        assert_eq!(
            err,
            CycleError::NoEligibleQuote {
                leg: Leg::UsdUsdt,
                rule: SelectionRule::MinAsk,
            }
        );
        assert!(err.to_string().starts_with("USD/USDT"));
    }

    #[tokio::test]
    async fn test_configured_default_selection() {
        let quotes = MockQuotes::scenario();
        let rates = MockRates::new(Some(1250.0));
        let defaults = RunDefaults {
            start_amount: 100.0,
            usdt_usd: VenueSelection::from_names(Pair::UsdtUsd, ["buenbit", "fiwind"]),
            usdt_ars: VenueSelection::from_names(Pair::UsdtArs, ["ripio"]),
        };

        let run = assert_ok!(
            runner(&quotes, &rates)
                .with_defaults(defaults)
                .run(&CycleRequest::default())
                .await
        );
        assert_eq!(run.result.start_amount, 100.0);
        assert_eq!(run.result.usd_to_usdt.venue, "fiwind");
        assert_eq!(run.result.usdt_to_ars.venue, "ripio");
        let expected = 100.0 / 1.01 * 1200.0 / 1250.0;
        assert!(approx(run.result.final_usd, expected));
    }

    #[tokio::test]
    async fn test_profitable_cycle_on_buy_side() {
        let quotes = MockQuotes::scenario();
        let rates = MockRates::new(Some(1000.0));
        let request = CycleRequest {
            usdt_ars: VenueLegRequest::new(LegConfig::auto().with_side(Side::Buy)),
            ..Default::default()
        };

        let run = assert_ok!(runner(&quotes, &rates).run(&request).await);
        // Buying takes the lowest ask, and the amount is still multiplied
        assert_eq!(run.result.usdt_to_ars.venue, "ripio");
        assert_eq!(run.result.usdt_to_ars.rule, Some(SelectionRule::MinAsk));
        assert!(approx(run.result.final_usd, 1.23));
        assert!(approx(run.result.profit_percent, 23.0));
        assert!(run.result.is_profitable());
    }

    #[tokio::test]
    async fn test_fully_manual_cycle_never_fetches() {
        let quotes = MockQuotes::scenario();
        let rates = MockRates::new(Some(1250.0));
        let request = CycleRequest {
            start_amount: Some(10.0),
            usd_usdt: VenueLegRequest::new(LegConfig::manual(1.25)),
            usdt_ars: VenueLegRequest::new(LegConfig::manual(1300.0)),
            ars_usd: LegConfig::manual(1040.0),
        };

        let run = assert_ok!(runner(&quotes, &rates).run(&request).await);
        assert!(quotes.calls().is_empty());
        assert_eq!(rates.calls(), 0);
        assert!(approx(run.result.final_usd, 10.0));
        assert!(approx(run.result.profit_percent, 0.0));
        assert!(run.result.legs().iter().all(|l| l.is_manual()));
    }

    #[tokio::test]
    async fn test_missing_official_rate_is_invalid_input() {
        let quotes = MockQuotes::scenario();
        let rates = MockRates::new(None);

        let err = assert_err!(runner(&quotes, &rates).run(&CycleRequest::default()).await);
        assert!(matches!(err, CycleError::InvalidLegInput { leg: Leg::ArsUsd, .. }));
    }

    #[tokio::test]
    async fn test_transport_errors_surface_in_leg_order() {
        let quotes = MockQuotes::scenario();
        quotes.fail(Pair::UsdtArs, "HTTP 503");
        let rates = MockRates::new(Some(1250.0));
        rates.set_error("connection reset");

        let err = assert_err!(runner(&quotes, &rates).run(&CycleRequest::default()).await);
        match err {
            CycleError::Transport { source_name, message } => {
                assert_eq!(source_name, "mock USDT/ARS");
                assert_eq!(message, "HTTP 503");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_earlier_leg_error_beats_later_transport_error() {
        let quotes = MockQuotes::scenario();
        let rates = MockRates::new(Some(1250.0));
        rates.set_error("connection reset");
        let request = CycleRequest {
            usd_usdt: VenueLegRequest::new(LegConfig::manual(1.0)),
            usdt_ars: VenueLegRequest::new(LegConfig::auto().with_side(Side::Sell))
                .with_venues(Vec::<String>::new()),
            ..Default::default()
        };

        let err = assert_err!(runner(&quotes, &rates).run(&request).await);
        assert_eq!(
            err,
            CycleError::NoEligibleQuote {
                leg: Leg::UsdtArs,
                rule: SelectionRule::MaxBid,
            }
        );
    }

    #[tokio::test]
    async fn test_rate_transport_error_surfaces_on_closing_leg() {
        let quotes = MockQuotes::scenario();
        let rates = MockRates::new(Some(1250.0));
        rates.set_error("connection reset");

        let err = assert_err!(runner(&quotes, &rates).run(&CycleRequest::default()).await);
        assert_eq!(err, CycleError::transport("mock oficial", "connection reset"));
    }

    #[tokio::test]
    async fn test_quote_book_order_breaks_ties() {
        let quotes = MockQuotes::scenario();
        quotes.set_book(
            Pair::UsdtUsd,
            vec![
                Quote::new("tiendacrypto", Some(1.00), None),
                Quote::new("belo", Some(1.00), None),
            ],
        );
        let rates = MockRates::new(Some(1250.0));

        let run = assert_ok!(runner(&quotes, &rates).run(&CycleRequest::default()).await);
        assert_eq!(run.result.usd_to_usdt.venue, "tiendacrypto");
    }

    #[tokio::test]
    async fn test_raw_data_is_kept() {
        let quotes = MockQuotes::scenario();
        let rates = MockRates::new(Some(1250.0));
        let request = CycleRequest {
            ars_usd: LegConfig::manual(1200.0),
            ..Default::default()
        };

        let run = assert_ok!(runner(&quotes, &rates).run(&request).await);
        assert_eq!(run.raw.usdt_usd.as_ref().map(QuoteBook::len), Some(3));
        assert_eq!(run.raw.usdt_ars.as_ref().map(QuoteBook::len), Some(2));
        assert!(run.raw.official_rate.is_none());
        assert_eq!(run.result.ars_to_usd.venue, "Manual");
    }

    #[test]
    fn test_calculator_timestamp_in_reporting_timezone() {
        let quotes: QuoteBook = [Quote::new("belo", Some(1.0), Some(1.0))].into_iter().collect();
        let ars: QuoteBook = [Quote::new("ripio", Some(1000.0), Some(1000.0))]
            .into_iter()
            .collect();
        let usd_sel = VenueSelection::all(Pair::UsdtUsd);
        let ars_sel = VenueSelection::all(Pair::UsdtArs);
        let official = OfficialRate {
            name: "Oficial".to_string(),
            sell_rate: Some(1000.0),
        };
        let at = chrono::Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();

        let result = assert_ok!(calculator().compute_at(
            1.0,
            VenueLeg {
                config: LegConfig::auto(),
                quotes: Ok(&quotes),
                enabled: &usd_sel,
            },
            VenueLeg {
                config: LegConfig::auto(),
                quotes: Ok(&ars),
                enabled: &ars_sel,
            },
            ClosingRate::Official(&official),
            at,
        ));
        // 03:04 UTC is 00:04 in Buenos Aires (UTC-3)
        assert!(result.timestamp.contains("00:04:05"));
        assert!(result.timestamp.contains("January 2026"));
        assert_eq!(result.captured_at, at);
    }
}
