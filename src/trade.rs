//! Buy/sell confirmation flow.
//!
//! `Idle -> PanelOpen -> Confirming -> Idle | PanelOpen`. Every opened panel gets a fresh
//! generation; a submission carries the generation it was confirmed from, so a result that
//! arrives after the panel was closed (or replaced) is recognised and discarded.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::api::Backend;
use crate::data::{SelectedInstrument, Symbol, TradeReceipt, TradeSide};
use crate::error::{AppError, FetchError, ValidationError};

/// Commission charged on buys. Sells carry no fee.
pub const BUY_FEE_RATE: Decimal = dec!(0.0025);

fn notional_of(price: Decimal, quantity: u32) -> Result<Decimal, ValidationError> {
    price
        .checked_mul(Decimal::from(quantity))
        .ok_or(ValidationError::TooLarge)
}

/// `round(price * quantity * rate, 2)`, half away from zero; zero on sell
pub fn fee_for(
    side: TradeSide,
    price: Decimal,
    quantity: u32,
) -> Result<Decimal, ValidationError> {
    match side {
        TradeSide::Buy => Ok(notional_of(price, quantity)?
            .checked_mul(BUY_FEE_RATE)
            .ok_or(ValidationError::TooLarge)?
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)),
        TradeSide::Sell => Ok(Decimal::ZERO),
    }
}

/// Parse user-entered quantity: a whole number of at least one
pub fn parse_quantity(input: &str) -> Result<u32, ValidationError> {
    let input = input.trim();
    let value: Decimal = input.parse().map_err(|_| ValidationError::NotInteger)?;
    if !value.fract().is_zero() {
        return Err(ValidationError::NotInteger);
    }
    if value <= Decimal::ZERO {
        return Err(ValidationError::NonPositive);
    }
    value.to_u32().ok_or(ValidationError::TooLarge)
}

/// Not-yet-submitted parameters of a trade.
///
/// Amounts are computed once on construction; a price and quantity whose amounts do not
/// fit a `Decimal` are rejected as [`ValidationError::TooLarge`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TradeIntent {
    pub symbol: Symbol,
    pub side: TradeSide,
    pub quantity: u32,
    pub price: Decimal,
    pub fee: Decimal,
    notional: Decimal,
    total: Decimal,
}

impl TradeIntent {
    pub fn new(
        symbol: Symbol,
        side: TradeSide,
        quantity: u32,
        price: Decimal,
    ) -> Result<Self, ValidationError> {
        let notional = notional_of(price, quantity)?;
        let fee = fee_for(side, price, quantity)?;
        let total = notional
            .checked_add(fee)
            .ok_or(ValidationError::TooLarge)?;
        Ok(Self {
            symbol,
            side,
            quantity,
            price,
            fee,
            notional,
            total,
        })
    }

    pub fn notional(&self) -> Decimal {
        self.notional
    }

    /// Notional plus fee; sells carry no fee
    pub fn total(&self) -> Decimal {
        self.total
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TradePhase {
    Idle,
    PanelOpen,
    Confirming,
}

#[derive(Clone, Debug)]
pub struct TradePanel {
    pub generation: u64,
    pub side: TradeSide,
    pub symbol: Symbol,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
    /// Last validation or submission error, cleared on the next confirm
    pub error: Option<AppError>,
}

impl TradePanel {
    pub fn intent(&self) -> Result<TradeIntent, ValidationError> {
        self.intent_for(self.quantity)
    }

    fn intent_for(&self, quantity: u32) -> Result<TradeIntent, ValidationError> {
        TradeIntent::new(self.symbol.clone(), self.side, quantity, self.price)
    }
}

/// A confirmed intent on its way to the backend
#[derive(Clone, Debug)]
pub struct Submission {
    pub ticket: u64,
    pub intent: TradeIntent,
}

/// What the caller must do once a submission resolves
#[derive(Debug, PartialEq, Eq)]
pub enum Settlement {
    /// Panel closed; wallet, portfolio and history must be refetched
    Completed(TradeReceipt),
    /// Panel kept open with the error shown
    Failed(AppError),
    /// The panel this belonged to is gone; nothing is shown
    Discarded { executed: bool },
}

impl Settlement {
    /// The trade went through, so backend-owned snapshots are out of date
    pub fn invalidates_caches(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Discarded { executed: true })
    }
}

#[derive(Debug, Default)]
pub struct TradeFlow {
    panel: Option<TradePanel>,
    generation: u64,
    in_flight: Option<u64>,
}

impl TradeFlow {
    pub fn phase(&self) -> TradePhase {
        match &self.panel {
            None => TradePhase::Idle,
            Some(panel) if self.in_flight == Some(panel.generation) => TradePhase::Confirming,
            Some(_) => TradePhase::PanelOpen,
        }
    }

    pub fn panel(&self) -> Option<&TradePanel> {
        self.panel.as_ref()
    }

    /// A submission is outstanding, possibly for a panel that was already closed
    pub fn is_submitting(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Open a panel for the selected instrument with quantity 1
    pub fn open(
        &mut self,
        instrument: &SelectedInstrument,
        side: TradeSide,
    ) -> Result<(), ValidationError> {
        if instrument.symbol.is_empty() {
            return Err(ValidationError::NoSelection);
        }
        if instrument.price.is_sign_negative() {
            return Err(ValidationError::NegativePrice);
        }
        if self.phase() == TradePhase::Confirming {
            tracing::debug!("ignore open while confirming");
            return Ok(());
        }

        let panel = TradePanel {
            generation: self.generation + 1,
            side,
            symbol: instrument.symbol.clone(),
            name: instrument.name.clone(),
            price: instrument.price,
            quantity: 1,
            error: None,
        };
        panel.intent()?;
        self.generation = panel.generation;
        self.panel = Some(panel);
        Ok(())
    }

    fn editable(&mut self) -> Option<&mut TradePanel> {
        let generation = self.panel.as_ref()?.generation;
        if self.in_flight == Some(generation) {
            return None;
        }
        self.panel.as_mut()
    }

    /// Set quantity from text input. Invalid input leaves the last valid quantity in place.
    pub fn set_quantity(&mut self, input: &str) -> Result<u32, ValidationError> {
        let parsed = parse_quantity(input);
        let Some(panel) = self.editable() else {
            return parsed;
        };
        match parsed.and_then(|quantity| panel.intent_for(quantity).map(|_| quantity)) {
            Ok(quantity) => {
                panel.quantity = quantity;
                panel.error = None;
                Ok(quantity)
            }
            Err(err) => {
                panel.error = Some(err.into());
                Err(err)
            }
        }
    }

    /// One more share, unless the amounts would no longer fit
    pub fn increment(&mut self) {
        if let Some(panel) = self.editable() {
            let next = panel.quantity.saturating_add(1);
            match panel.intent_for(next) {
                Ok(_) => {
                    panel.quantity = next;
                    panel.error = None;
                }
                Err(err) => panel.error = Some(err.into()),
            }
        }
    }

    pub fn decrement(&mut self) {
        if let Some(panel) = self.editable() {
            panel.quantity = panel.quantity.saturating_sub(1).max(1);
            panel.error = None;
        }
    }

    /// Move to `Confirming`. `None` when there is no open panel or a submission is
    /// already outstanding; the caller must not call the backend in that case.
    pub fn confirm(&mut self) -> Option<Submission> {
        if self.in_flight.is_some() {
            tracing::debug!("ignore confirm while a trade is in flight");
            return None;
        }
        let panel = self.panel.as_mut()?;
        let intent = match panel.intent() {
            Ok(intent) => intent,
            Err(err) => {
                panel.error = Some(err.into());
                return None;
            }
        };
        panel.error = None;
        self.in_flight = Some(panel.generation);
        Some(Submission {
            ticket: panel.generation,
            intent,
        })
    }

    /// Cancel: close the panel at any point. An outstanding submission keeps running.
    pub fn close(&mut self) {
        self.panel = None;
    }

    /// Apply the result of a submission
    pub fn finish(
        &mut self,
        ticket: u64,
        result: Result<TradeReceipt, FetchError>,
    ) -> Settlement {
        if self.in_flight == Some(ticket) {
            self.in_flight = None;
        }

        let relevant = self.panel.as_ref().is_some_and(|p| p.generation == ticket);
        if !relevant {
            tracing::info!(ticket, executed = result.is_ok(), "discard result for closed panel");
            return Settlement::Discarded {
                executed: result.is_ok(),
            };
        }

        match result {
            Ok(receipt) => {
                self.panel = None;
                Settlement::Completed(receipt)
            }
            Err(err) => {
                let err = AppError::from_write(err);
                if let Some(panel) = self.panel.as_mut() {
                    panel.error = Some(err.clone());
                }
                Settlement::Failed(err)
            }
        }
    }
}

/// Send a confirmed intent to the backend
pub async fn submit(
    backend: &dyn Backend,
    submission: &Submission,
) -> Result<TradeReceipt, FetchError> {
    let intent = &submission.intent;
    tracing::info!(
        ticket = submission.ticket,
        symbol = %intent.symbol,
        side = intent.side.path(),
        quantity = intent.quantity,
        price = %intent.price,
        "submit trade"
    );
    backend.submit_trade(intent).await
}

#[cfg(test)]
mod tests {
    use super::{
        fee_for, parse_quantity, submit, Settlement, TradeFlow, TradeIntent, TradePhase,
    };
    use crate::data::{Quote, SelectedInstrument, Symbol, TradeReceipt, TradeSide};
    use crate::error::{AppError, FetchError, ValidationError};
    use crate::testkit::FakeBackend;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn instrument() -> SelectedInstrument {
        SelectedInstrument::from(&Quote::new("MSFT", "Microsoft", dec!(10.00), dec!(0)))
    }

    fn receipt(intent: &TradeIntent) -> TradeReceipt {
        TradeReceipt {
            id: Some("t1".to_string()),
            symbol: intent.symbol.clone(),
            side: intent.side,
            quantity: intent.quantity,
            price: intent.price,
            total: Some(intent.total()),
        }
    }

    #[test]
    fn buy_total_includes_rounded_fee() {
        let intent = TradeIntent::new(Symbol::new("MSFT"), TradeSide::Buy, 3, dec!(10.00))
            .expect("intent");
        assert_eq!(intent.fee, dec!(0.08));
        assert_eq!(intent.total(), dec!(30.08));
    }

    #[test]
    fn sell_total_has_no_fee() {
        let intent = TradeIntent::new(Symbol::new("MSFT"), TradeSide::Sell, 3, dec!(10.00))
            .expect("intent");
        assert_eq!(intent.fee, dec!(0));
        assert_eq!(intent.total(), dec!(30.00));
    }

    #[test]
    fn fee_rounds_half_away_from_zero() {
        // 2 * 1.00 * 0.0025 = 0.005
        assert_eq!(fee_for(TradeSide::Buy, dec!(1.00), 2), Ok(dec!(0.01)));
        // 1 * 1.00 * 0.0025 = 0.0025
        assert_eq!(fee_for(TradeSide::Buy, dec!(1.00), 1), Ok(dec!(0.00)));
    }

    #[test]
    fn oversized_amounts_are_rejected() {
        assert_eq!(
            fee_for(TradeSide::Buy, Decimal::MAX, 2),
            Err(ValidationError::TooLarge)
        );
        assert_eq!(
            TradeIntent::new(Symbol::new("MSFT"), TradeSide::Sell, u32::MAX, Decimal::MAX),
            Err(ValidationError::TooLarge)
        );

        let mut flow = TradeFlow::default();
        let whale = SelectedInstrument::from(&Quote::new("MSFT", "", Decimal::MAX, dec!(0)));
        flow.open(&whale, TradeSide::Sell).expect("one share fits");
        assert_eq!(
            flow.set_quantity(&u32::MAX.to_string()),
            Err(ValidationError::TooLarge)
        );
        flow.increment();
        let panel = flow.panel().expect("panel");
        assert_eq!(panel.quantity, 1);
        assert_eq!(
            panel.error,
            Some(AppError::Validation(ValidationError::TooLarge))
        );
        assert_eq!(flow.confirm().map(|s| s.intent.notional()), Some(Decimal::MAX));
    }

    #[test]
    fn quantity_must_be_positive_integer() {
        assert_eq!(parse_quantity(" 12 "), Ok(12));
        assert_eq!(parse_quantity("3.0"), Ok(3));
        assert_eq!(parse_quantity("2.5"), Err(ValidationError::NotInteger));
        assert_eq!(parse_quantity("abc"), Err(ValidationError::NotInteger));
        assert_eq!(parse_quantity(""), Err(ValidationError::NotInteger));
        assert_eq!(parse_quantity("0"), Err(ValidationError::NonPositive));
        assert_eq!(parse_quantity("-4"), Err(ValidationError::NonPositive));
        assert_eq!(parse_quantity("99999999999"), Err(ValidationError::TooLarge));
    }

    #[test]
    fn open_requires_selection() {
        let mut flow = TradeFlow::default();
        let empty = SelectedInstrument::default();
        assert_eq!(
            flow.open(&empty, TradeSide::Buy),
            Err(ValidationError::NoSelection)
        );
        assert_eq!(flow.phase(), TradePhase::Idle);
    }

    #[test]
    fn quantity_has_floor_of_one() {
        let mut flow = TradeFlow::default();
        flow.open(&instrument(), TradeSide::Buy).expect("open");
        flow.decrement();
        assert_eq!(flow.panel().map(|p| p.quantity), Some(1));
        flow.increment();
        flow.increment();
        assert_eq!(flow.panel().map(|p| p.quantity), Some(3));

        assert!(flow.set_quantity("0").is_err());
        let panel = flow.panel().expect("panel");
        assert_eq!(panel.quantity, 3, "invalid input keeps last quantity");
        assert_eq!(
            panel.error,
            Some(AppError::Validation(ValidationError::NonPositive))
        );
    }

    #[test]
    fn confirm_is_single_flight() {
        let mut flow = TradeFlow::default();
        flow.open(&instrument(), TradeSide::Buy).expect("open");
        let first = flow.confirm().expect("first confirm");
        assert_eq!(flow.phase(), TradePhase::Confirming);
        assert!(flow.confirm().is_none());

        // quantity is frozen while confirming
        flow.increment();
        assert_eq!(flow.panel().map(|p| p.quantity), Some(1));

        let settlement = flow.finish(first.ticket, Ok(receipt(&first.intent)));
        assert!(matches!(settlement, Settlement::Completed(_)));
        assert!(settlement.invalidates_caches());
        assert_eq!(flow.phase(), TradePhase::Idle);
    }

    #[test]
    fn failure_keeps_panel_and_quantity() {
        let mut flow = TradeFlow::default();
        flow.open(&instrument(), TradeSide::Sell).expect("open");
        flow.set_quantity("5").expect("quantity");
        let submission = flow.confirm().expect("confirm");

        let settlement = flow.finish(
            submission.ticket,
            Err(FetchError::Rejected("insufficient shares".to_string())),
        );
        assert!(matches!(settlement, Settlement::Failed(AppError::Persistence(_))));
        assert!(!settlement.invalidates_caches());
        assert_eq!(flow.phase(), TradePhase::PanelOpen);
        let panel = flow.panel().expect("panel stays open");
        assert_eq!(panel.quantity, 5);
        assert!(panel.error.is_some());

        // retry is allowed
        assert!(flow.confirm().is_some());
    }

    #[test]
    fn result_after_cancel_is_discarded() {
        let mut flow = TradeFlow::default();
        flow.open(&instrument(), TradeSide::Buy).expect("open");
        let submission = flow.confirm().expect("confirm");
        flow.close();
        assert_eq!(flow.phase(), TradePhase::Idle);

        // a new panel cannot submit while the old trade is still outstanding
        flow.open(&instrument(), TradeSide::Buy).expect("reopen");
        assert_eq!(flow.phase(), TradePhase::PanelOpen);
        assert!(flow.confirm().is_none());

        let settlement = flow.finish(
            submission.ticket,
            Err(FetchError::Timeout(std::time::Duration::from_secs(10))),
        );
        assert_eq!(settlement, Settlement::Discarded { executed: false });
        let panel = flow.panel().expect("new panel untouched");
        assert!(panel.error.is_none());
        assert!(!flow.is_submitting());
    }

    #[test]
    fn discarded_success_still_invalidates() {
        let mut flow = TradeFlow::default();
        flow.open(&instrument(), TradeSide::Buy).expect("open");
        let submission = flow.confirm().expect("confirm");
        flow.close();
        let settlement = flow.finish(submission.ticket, Ok(receipt(&submission.intent)));
        assert_eq!(settlement, Settlement::Discarded { executed: true });
        assert!(settlement.invalidates_caches());
    }

    #[test]
    fn unauthorized_submit_asks_for_login() {
        let mut flow = TradeFlow::default();
        flow.open(&instrument(), TradeSide::Buy).expect("open");
        let submission = flow.confirm().expect("confirm");
        let settlement = flow.finish(
            submission.ticket,
            Err(FetchError::Status {
                status: 401,
                message: None,
            }),
        );
        assert_eq!(settlement, Settlement::Failed(AppError::AuthRequired));
    }

    #[tokio::test]
    async fn submit_posts_intent_once() {
        let backend = FakeBackend::default();
        let mut flow = TradeFlow::default();
        flow.open(&instrument(), TradeSide::Buy).expect("open");
        flow.set_quantity("3").expect("quantity");
        let submission = flow.confirm().expect("confirm");
        assert!(flow.confirm().is_none());

        let receipt = submit(&backend, &submission).await.expect("receipt");
        assert_eq!(receipt.quantity, 3);
        assert_eq!(backend.trade_calls(), 1);
        assert_eq!(backend.last_trade().map(|i| i.total()), Some(dec!(30.08)));
    }
}
