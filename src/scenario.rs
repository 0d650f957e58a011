//! Full recalculation over an input snapshot
//!
//! `Calculator` holds the pricing assumptions once and evaluates any number of
//! independent `CalculationInput`s. Each call runs the whole chain (rates,
//! insurance, budget, fee solvers, schedule, effective rate) and returns a
//! complete `CalculationResult`; nothing is cached between calls.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::annuity::{self, LoanTerms};
use crate::assumptions::{monthly_insurance, Assumptions};
use crate::borrower::CalculationInput;
use crate::error::{MortgageError, MortgageResult};
use crate::projection::{
    generate_gigogne_schedule, max_loan_with_gigogne, optimal_secondary_amount, AmortizationEngine,
    GigogneCapacity, GigogneSplit, GigogneTerms, Schedule, ScheduleConfig,
};
use crate::solver::{
    effective_rate, monthly_budget, optimize_price_with_insurance, required_loan, solve_max_price,
    EffectiveRate, LoanSolution, PriceSolution, PurchaseContext,
};

/// Gigogne part of a result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GigogneOutcome {
    /// Split actually used for the required loan
    pub split: GigogneSplit,
    /// Budget capacity before fees and insurance
    pub capacity: GigogneCapacity,
    /// Single-loan rate with the same level payment as the blend
    pub blended_rate_percent: f64,
}

/// Cost of credit over the life of the loan
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CostSummary {
    pub total_interest: f64,
    pub total_insurance: f64,
    pub guarantee_fee: f64,
    pub dossier_fee: f64,
    /// Interest + insurance + guarantee + dossier
    pub total_credit_cost: f64,
    /// Every instalment including insurance
    pub total_paid: f64,
}

/// Complete output snapshot of one recalculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    // Budget
    pub monthly_income: f64,
    pub monthly_charges: f64,
    pub monthly_budget: f64,

    // Pricing
    pub nominal_rate_percent: f64,
    /// Annual insurance rate (decimal)
    pub insurance_rate: f64,

    // Affordability
    pub max_price_without_insurance: PriceSolution,
    pub max_affordable: PriceSolution,
    pub selected_price: f64,
    pub required_loan: LoanSolution,

    // Monthly cost
    pub monthly_payment: f64,
    pub monthly_insurance: f64,
    pub monthly_payment_with_insurance: f64,

    pub taeg: EffectiveRate,
    pub gigogne: Option<GigogneOutcome>,
    pub costs: CostSummary,
    pub schedule: Schedule,
}

/// Monthly payment for a loan, and the split when gigogne smoothing applies
struct Financing {
    payment: f64,
    split: Option<GigogneSplit>,
}

/// Pre-loaded calculator for repeated recalculations
#[derive(Debug, Clone)]
pub struct Calculator {
    assumptions: Assumptions,
}

impl Calculator {
    /// Create calculator with default in-memory assumptions
    pub fn new() -> Self {
        Self {
            assumptions: Assumptions::default_pricing(),
        }
    }

    /// Create calculator by loading assumptions from CSV files
    pub fn from_csv() -> MortgageResult<Self> {
        Ok(Self {
            assumptions: Assumptions::from_csv()?,
        })
    }

    /// Create calculator from specific assumptions directory
    pub fn from_csv_path(path: &std::path::Path) -> MortgageResult<Self> {
        Ok(Self {
            assumptions: Assumptions::from_csv_path(path)?,
        })
    }

    /// Create calculator with pre-built assumptions
    pub fn with_assumptions(assumptions: Assumptions) -> Self {
        Self { assumptions }
    }

    pub fn assumptions(&self) -> &Assumptions {
        &self.assumptions
    }

    pub fn assumptions_mut(&mut self) -> &mut Assumptions {
        &mut self.assumptions
    }

    fn finance(
        &self,
        loan: f64,
        nominal: f64,
        years: u32,
        gigogne: Option<(&GigogneTerms, f64)>,
    ) -> Financing {
        match gigogne {
            Some((terms, max_secondary)) => {
                let settings = &self.assumptions.solver;
                let optimum = optimal_secondary_amount(loan, terms, max_secondary, settings);
                Financing {
                    payment: optimum.split.blended_payment,
                    split: Some(optimum.split),
                }
            }
            None => Financing {
                payment: annuity::monthly_payment(loan, nominal, years),
                split: None,
            },
        }
    }

    /// Run the full calculation chain for one input snapshot
    pub fn recalculate(&self, input: &CalculationInput) -> MortgageResult<CalculationResult> {
        input.validate()?;

        let settings = &self.assumptions.solver;
        let fees = &self.assumptions.fees;
        let years = input.duration_years;

        let rates = if input.rates.is_empty() {
            &self.assumptions.rates
        } else {
            &input.rates
        };
        if rates.is_empty() {
            return Err(MortgageError::RateUnavailable { duration_years: years });
        }
        let nominal = rates.interpolate(years);
        let insurance_rate = self.assumptions.insurance.rate_for_age(input.age);

        let monthly_income = input.monthly_income();
        let monthly_charges = input.monthly_charges();
        let budget = monthly_budget(monthly_income, monthly_charges, settings.max_debt_ratio);

        let ctx = PurchaseContext {
            capital: input.capital,
            category: input.property_category,
            dossier_fee: input.dossier_fee,
        };

        let gigogne_terms = input.active_gigogne().map(|g| {
            (
                GigogneTerms {
                    primary_rate_percent: nominal,
                    primary_years: years,
                    secondary_rate_percent: g.secondary_rate_percent,
                    secondary_years: g.secondary_duration_years,
                },
                g.max_secondary_amount,
            )
        });
        let gigogne = gigogne_terms.as_ref().map(|(terms, max)| (terms, *max));

        // Borrowing capacity and the price it buys before insurance
        let capacity =
            gigogne.map(|(terms, max)| max_loan_with_gigogne(budget, terms, max, settings));
        let loan_capacity = match &capacity {
            Some(c) => c.total,
            None => annuity::max_loan(budget, nominal, years),
        };
        let without_insurance = solve_max_price(loan_capacity, &ctx, fees, settings);

        // Fold insurance in
        let max_affordable = optimize_price_with_insurance(
            without_insurance.max_price,
            budget,
            &ctx,
            fees,
            settings,
            |loan| {
                self.finance(loan, nominal, years, gigogne).payment
                    + monthly_insurance(loan, insurance_rate)
            },
        );

        let selected_price = input.target_price.unwrap_or(max_affordable.max_price);
        let loan_solution = required_loan(selected_price, &ctx, fees, settings);
        let loan = loan_solution.required_loan;

        let financing = self.finance(loan, nominal, years, gigogne);
        let insurance = monthly_insurance(loan, insurance_rate);

        let schedule = match (&financing.split, &gigogne_terms) {
            (Some(split), Some((terms, _))) => Schedule::Gigogne(generate_gigogne_schedule(
                split,
                terms,
                insurance,
                input.first_payment_date,
            )),
            _ => {
                let engine = AmortizationEngine::new(ScheduleConfig {
                    first_payment_date: input.first_payment_date,
                });
                Schedule::Single(engine.project(&LoanTerms::new(loan, nominal, years), insurance))
            }
        };

        // Effective rate floor: the nominal rate, or for a blend the equivalent single rate
        let rate_floor = match financing.split {
            Some(_) => {
                effective_rate(loan, financing.payment, years, 0.0, settings).annual_rate_percent
            }
            None => nominal,
        };
        let net_loan = loan - loan_solution.fees.credit_fees();
        let all_in_payment = financing.payment + insurance;
        let taeg = effective_rate(net_loan, all_in_payment, years, rate_floor, settings);

        let summary = schedule.summary();
        let costs = CostSummary {
            total_interest: summary.total_interest,
            total_insurance: summary.total_insurance,
            guarantee_fee: loan_solution.fees.guarantee_fee,
            dossier_fee: loan_solution.fees.dossier_fee,
            total_credit_cost: summary.total_interest
                + summary.total_insurance
                + loan_solution.fees.guarantee_fee
                + loan_solution.fees.dossier_fee,
            total_paid: summary.total_paid,
        };

        let gigogne_outcome = match (financing.split, capacity) {
            (Some(split), Some(capacity)) => Some(GigogneOutcome {
                split,
                capacity,
                blended_rate_percent: rate_floor,
            }),
            _ => None,
        };

        log::info!(
            "recalculated {}y: price {:.0}, loan {:.0}, payment {:.2}, TAEG {:.3}%",
            years,
            selected_price,
            loan,
            financing.payment + insurance,
            taeg.annual_rate_percent
        );

        Ok(CalculationResult {
            monthly_income,
            monthly_charges,
            monthly_budget: budget,
            nominal_rate_percent: nominal,
            insurance_rate,
            max_price_without_insurance: without_insurance,
            max_affordable,
            selected_price,
            required_loan: loan_solution,
            monthly_payment: financing.payment,
            monthly_insurance: insurance,
            monthly_payment_with_insurance: financing.payment + insurance,
            taeg,
            gigogne: gigogne_outcome,
            costs,
            schedule,
        })
    }

    /// Recalculate many independent inputs in parallel
    pub fn run_batch(&self, inputs: &[CalculationInput]) -> Vec<MortgageResult<CalculationResult>> {
        inputs.par_iter().map(|input| self.recalculate(input)).collect()
    }

    /// Recalculate the same borrower across several loan durations
    pub fn run_durations(
        &self,
        input: &CalculationInput,
        durations: &[u32],
    ) -> Vec<MortgageResult<CalculationResult>> {
        let inputs: Vec<CalculationInput> = durations
            .iter()
            .map(|&years| CalculationInput {
                duration_years: years,
                ..input.clone()
            })
            .collect();
        self.run_batch(&inputs)
    }
}

impl Default for Calculator {
    fn default() -> Self {
        Self::new()
    }
}
