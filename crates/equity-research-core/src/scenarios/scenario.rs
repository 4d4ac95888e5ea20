use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::types::*;
use crate::valuation::{calculate_dcf, calculate_upside, AssumptionSet, ValuationResult};
use crate::EngineResult;

// ---------------------------------------------------------------------------
// Perturbation bounds
// ---------------------------------------------------------------------------

const BULL_GROWTH_FACTOR: Decimal = dec!(1.5);
const BULL_GROWTH_CAP: Rate = dec!(0.25);
const BULL_MARGIN_FACTOR: Decimal = dec!(1.2);
const BULL_MARGIN_CAP: Rate = dec!(0.45);
const BULL_WACC_SHIFT: Rate = dec!(0.01);
const BULL_WACC_FLOOR: Rate = dec!(0.06);
const BULL_TERMINAL_SHIFT: Rate = dec!(0.005);
const BULL_TERMINAL_CAP: Rate = dec!(0.04);

const BEAR_GROWTH_FACTOR: Decimal = dec!(0.5);
const BEAR_GROWTH_FLOOR: Rate = dec!(0.02);
const BEAR_MARGIN_FACTOR: Decimal = dec!(0.8);
const BEAR_MARGIN_FLOOR: Rate = dec!(0.15);
const BEAR_WACC_SHIFT: Rate = dec!(0.02);
const BEAR_WACC_CAP: Rate = dec!(0.15);
const BEAR_TERMINAL_SHIFT: Rate = dec!(0.005);
const BEAR_TERMINAL_FLOOR: Rate = dec!(0.015);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Which way the base assumptions are pushed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioCase {
    Base,
    Bull,
    Bear,
}

impl ScenarioCase {
    /// Evaluation order for a full set
    pub const ALL: [ScenarioCase; 3] = [
        ScenarioCase::Base,
        ScenarioCase::Bull,
        ScenarioCase::Bear,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ScenarioCase::Base => "base",
            ScenarioCase::Bull => "bull",
            ScenarioCase::Bear => "bear",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScenarioCase::Base => "Base Case",
            ScenarioCase::Bull => "Bull Case",
            ScenarioCase::Bear => "Bear Case",
        }
    }

    /// Derive this case's assumptions from a base set.
    ///
    /// Only growth, margin, WACC and terminal growth move; each is bounded so
    /// a bull case never compounds past 25% growth and a bear case never
    /// discounts above 15%.
    pub fn apply(self, base: &AssumptionSet) -> AssumptionSet {
        match self {
            ScenarioCase::Base => base.clone(),
            ScenarioCase::Bull => AssumptionSet {
                revenue_growth: (base.revenue_growth * BULL_GROWTH_FACTOR).min(BULL_GROWTH_CAP),
                ebitda_margin: (base.ebitda_margin * BULL_MARGIN_FACTOR).min(BULL_MARGIN_CAP),
                wacc: (base.wacc - BULL_WACC_SHIFT).max(BULL_WACC_FLOOR),
                terminal_growth_rate: (base.terminal_growth_rate + BULL_TERMINAL_SHIFT)
                    .min(BULL_TERMINAL_CAP),
                ..base.clone()
            },
            ScenarioCase::Bear => AssumptionSet {
                revenue_growth: (base.revenue_growth * BEAR_GROWTH_FACTOR).max(BEAR_GROWTH_FLOOR),
                ebitda_margin: (base.ebitda_margin * BEAR_MARGIN_FACTOR).max(BEAR_MARGIN_FLOOR),
                wacc: (base.wacc + BEAR_WACC_SHIFT).min(BEAR_WACC_CAP),
                terminal_growth_rate: (base.terminal_growth_rate - BEAR_TERMINAL_SHIFT)
                    .max(BEAR_TERMINAL_FLOOR),
                ..base.clone()
            },
        }
    }
}

/// Valuation of one case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub case: ScenarioCase,
    pub label: String,
    /// The perturbed assumptions this case was valued on
    pub assumptions: AssumptionSet,
    pub valuation: ValuationResult,
    pub value_per_share: Money,
    pub enterprise_value: Money,
    pub equity_value: Money,
    /// Percent, 2 dp; zero when no price is known
    pub upside_pct: Decimal,
}

/// Base, bull and bear valuations of one company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSet {
    pub base: ScenarioResult,
    pub bull: ScenarioResult,
    pub bear: ScenarioResult,
}

impl ScenarioSet {
    pub fn get(&self, case: ScenarioCase) -> &ScenarioResult {
        match case {
            ScenarioCase::Base => &self.base,
            ScenarioCase::Bull => &self.bull,
            ScenarioCase::Bear => &self.bear,
        }
    }

    /// Results in base, bull, bear order
    pub fn iter(&self) -> impl Iterator<Item = &ScenarioResult> {
        ScenarioCase::ALL.into_iter().map(move |c| self.get(c))
    }

    /// True when bull ≥ base ≥ bear on value per share
    pub fn is_ordered(&self) -> bool {
        self.bull.value_per_share >= self.base.value_per_share
            && self.base.value_per_share >= self.bear.value_per_share
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Value the base case and its bull and bear perturbations.
///
/// Any case that fails to value fails the whole set; partial sets are never
/// returned.
pub fn generate_scenarios(base: &AssumptionSet) -> EngineResult<ComputationOutput<ScenarioSet>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let base_result = run_case(ScenarioCase::Base, base, &mut warnings)?;
    let bull_result = run_case(ScenarioCase::Bull, base, &mut warnings)?;
    let bear_result = run_case(ScenarioCase::Bear, base, &mut warnings)?;

    let set = ScenarioSet {
        base: base_result,
        bull: bull_result,
        bear: bear_result,
    };

    if !set.is_ordered() {
        warnings.push(format!(
            "Scenario values are not ordered bull >= base >= bear (bull {}, base {}, bear {}); \
             base assumptions may sit outside the scenario bounds",
            set.bull.value_per_share.round_dp(2),
            set.base.value_per_share.round_dp(2),
            set.bear.value_per_share.round_dp(2),
        ));
    }

    Ok(with_metadata(
        "Bull/Base/Bear scenario DCF",
        base,
        warnings,
        start,
        set,
    ))
}

fn run_case(
    case: ScenarioCase,
    base: &AssumptionSet,
    warnings: &mut Vec<String>,
) -> EngineResult<ScenarioResult> {
    let assumptions = case.apply(base);
    let dcf = calculate_dcf(&assumptions)?;
    absorb_warnings(warnings, case.label(), dcf.warnings);

    let valuation = dcf.result;
    let upside_pct = calculate_upside(valuation.value_per_share, assumptions.current_price);

    debug!(
        case = case.key(),
        value_per_share = %valuation.value_per_share,
        "scenario valued"
    );

    Ok(ScenarioResult {
        case,
        label: case.label().to_string(),
        value_per_share: valuation.value_per_share,
        enterprise_value: valuation.enterprise_value,
        equity_value: valuation.equity_value,
        upside_pct,
        assumptions,
        valuation,
    })
}
