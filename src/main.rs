//! Mortgage Engine CLI
//!
//! Command-line interface for running affordability simulations

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use mortgage_engine::borrower::{load_budget_items, load_input};
use mortgage_engine::{CalculationInput, CalculationResult, Calculator, Schedule};

/// Mortgage affordability, fees, amortization and effective rate
#[derive(Parser)]
#[command(name = "mortgage-engine", version, about = "Mortgage affordability and amortization calculations")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding the assumption CSV files (built-in defaults when omitted)
    #[arg(long, global = true)]
    assumptions: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Recalculate one input snapshot
    Simulate {
        /// Input snapshot (JSON)
        #[arg(long)]
        input: PathBuf,
        /// Replace the snapshot's incomes and expenses with a budget CSV
        #[arg(long)]
        budget: Option<PathBuf>,
        /// Schedule rows to print in table output
        #[arg(long, default_value_t = 12)]
        rows: usize,
        /// Write the full schedule to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Compare the same snapshot across loan durations
    Compare {
        /// Input snapshot (JSON)
        #[arg(long)]
        input: PathBuf,
        /// Durations in years
        #[arg(long, value_delimiter = ',', default_value = "15,20,25")]
        durations: Vec<u32>,
    },
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Json,
    Table,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let calculator = match &cli.assumptions {
        Some(path) => Calculator::from_csv_path(path)
            .with_context(|| format!("loading assumptions from {}", path.display()))?,
        None => Calculator::new(),
    };

    match cli.command {
        Commands::Simulate { input, budget, rows, csv } => {
            let mut snapshot = read_input(&input)?;
            if let Some(path) = budget {
                let items = load_budget_items(&path)
                    .with_context(|| format!("reading budget items from {}", path.display()))?;
                snapshot.incomes = items.incomes;
                snapshot.expenses = items.expenses;
            }

            let result = calculator.recalculate(&snapshot)?;
            match cli.output {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
                OutputFormat::Table => print_result(&result, rows),
            }

            if let Some(path) = csv {
                write_schedule_csv(&result.schedule, &path)?;
                println!("\nFull schedule written to: {}", path.display());
            }
        }
        Commands::Compare { input, durations } => {
            let snapshot = read_input(&input)?;
            let results = calculator
                .run_durations(&snapshot, &durations)
                .into_iter()
                .collect::<Result<Vec<_>, _>>()?;

            match cli.output {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&results)?),
                OutputFormat::Table => print_comparison(&durations, &results),
            }
        }
    }

    Ok(())
}

fn read_input(path: &Path) -> Result<CalculationInput> {
    load_input(path).with_context(|| format!("reading input snapshot {}", path.display()))
}

fn print_result(result: &CalculationResult, rows: usize) {
    println!("Budget:");
    println!("  Monthly Income:  {:>12.2}", result.monthly_income);
    println!("  Monthly Charges: {:>12.2}", result.monthly_charges);
    println!("  Monthly Budget:  {:>12.2}", result.monthly_budget);
    println!();

    println!("Affordability:");
    println!("  Nominal Rate:          {:>10.3}%", result.nominal_rate_percent);
    println!("  Insurance Rate:        {:>10.3}%", result.insurance_rate * 100.0);
    println!("  Max Price (no ins.):   {:>12.2}", result.max_price_without_insurance.max_price);
    println!("  Max Affordable Price:  {:>12.2}", result.max_affordable.max_price);
    println!("  Selected Price:        {:>12.2}", result.selected_price);
    println!();

    let loan = &result.required_loan;
    println!("Financing:");
    println!("  Notary Fees:     {:>12.2}", loan.fees.notary_fees);
    println!("  Guarantee Fee:   {:>12.2}", loan.fees.guarantee_fee);
    println!("  Dossier Fee:     {:>12.2}", loan.fees.dossier_fee);
    println!("  Required Loan:   {:>12.2}", loan.required_loan);
    if let Some(g) = &result.gigogne {
        println!("  Primary Tranche: {:>12.2}", g.split.primary);
        println!("  Secondary:       {:>12.2}  ({:.2}/month)", g.split.secondary, g.split.secondary_payment);
    }
    println!("  Payment:         {:>12.2}", result.monthly_payment);
    println!("  Insurance:       {:>12.2}", result.monthly_insurance);
    println!("  Total Monthly:   {:>12.2}", result.monthly_payment_with_insurance);
    println!("  TAEG:            {:>11.3}%", result.taeg.annual_rate_percent);
    if !result.taeg.convergence.converged {
        println!("  (effective rate did not converge)");
    }
    println!();

    print_schedule(&result.schedule, rows);

    let costs = &result.costs;
    println!("\nCost of Credit:");
    println!("  Total Interest:  {:>12.2}", costs.total_interest);
    println!("  Total Insurance: {:>12.2}", costs.total_insurance);
    println!("  Total Cost:      {:>12.2}", costs.total_credit_cost);
    println!("  Total Paid:      {:>12.2}", costs.total_paid);
}

fn print_schedule(schedule: &Schedule, rows: usize) {
    println!("Schedule ({} months):", schedule.len());
    match schedule {
        Schedule::Single(lines) => {
            println!("{:>5} {:>4} {:>12} {:>12} {:>12} {:>10} {:>14}",
                "Month", "Year", "Payment", "Principal", "Interest", "Insurance", "Remaining");
            println!("{}", "-".repeat(75));
            for row in lines.iter().take(rows) {
                println!("{:>5} {:>4} {:>12.2} {:>12.2} {:>12.2} {:>10.2} {:>14.2}",
                    row.period, row.year, row.payment, row.principal, row.interest, row.insurance,
                    row.remaining_principal);
            }
        }
        Schedule::Gigogne(lines) => {
            println!("{:>5} {:>4} {:>12} {:>12} {:>12} {:>10} {:>14}",
                "Month", "Year", "Payment", "Primary", "Secondary", "Insurance", "Remaining");
            println!("{}", "-".repeat(75));
            for row in lines.iter().take(rows) {
                println!("{:>5} {:>4} {:>12.2} {:>12.2} {:>12.2} {:>10.2} {:>14.2}",
                    row.period, row.year, row.payment, row.primary.payment, row.secondary.payment,
                    row.insurance, row.remaining_principal);
            }
        }
    }

    if schedule.len() > rows {
        println!("... ({} more months)", schedule.len() - rows);
    }
}

fn print_comparison(durations: &[u32], results: &[CalculationResult]) {
    println!("{:>6} {:>8} {:>14} {:>14} {:>12} {:>8}",
        "Years", "Rate", "Max Price", "Loan", "Monthly", "TAEG");
    println!("{}", "-".repeat(67));
    for (years, result) in durations.iter().zip(results) {
        println!("{:>6} {:>7.3}% {:>14.2} {:>14.2} {:>12.2} {:>7.3}%",
            years,
            result.nominal_rate_percent,
            result.max_affordable.max_price,
            result.required_loan.required_loan,
            result.monthly_payment_with_insurance,
            result.taeg.annual_rate_percent);
    }
}

fn write_schedule_csv(schedule: &Schedule, path: &Path) -> Result<()> {
    let mut file = File::create(path).with_context(|| format!("creating {}", path.display()))?;

    match schedule {
        Schedule::Single(lines) => {
            writeln!(file, "Month,Year,Date,Payment,Principal,Interest,Insurance,CumulativePaid,Remaining")?;
            for row in lines {
                writeln!(file, "{},{},{},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2}",
                    row.period,
                    row.year,
                    row.payment_date.map(|d| d.to_string()).unwrap_or_default(),
                    row.payment,
                    row.principal,
                    row.interest,
                    row.insurance,
                    row.cumulative_paid,
                    row.remaining_principal,
                )?;
            }
        }
        Schedule::Gigogne(lines) => {
            writeln!(file, "Month,Year,Date,Payment,PrimaryPayment,PrimaryInterest,PrimaryBalance,SecondaryPayment,SecondaryInterest,SecondaryBalance,Insurance,CumulativePaid,Remaining")?;
            for row in lines {
                writeln!(file, "{},{},{},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2}",
                    row.period,
                    row.year,
                    row.payment_date.map(|d| d.to_string()).unwrap_or_default(),
                    row.payment,
                    row.primary.payment,
                    row.primary.interest,
                    row.primary.balance,
                    row.secondary.payment,
                    row.secondary.interest,
                    row.secondary.balance,
                    row.insurance,
                    row.cumulative_paid,
                    row.remaining_principal,
                )?;
            }
        }
    }

    Ok(())
}
