//! Income Allocator CLI
//!
//! Command-line interface over the allocation, projection and rebalancing library

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use income_allocator::instruments::{catalog_coupon_payments, coupon_payments, coupon_stats};
use income_allocator::scenario::{default_comparison_set, ScenarioComparison, ScenarioRunner};
use income_allocator::strategy::{
    RebalanceFrequency, RebalanceRecord, RebalanceSummary, StrategyKind, TwoTierPolicy,
};
use income_allocator::{ScenarioKey, SimulationConfig};

#[derive(Parser)]
#[command(name = "income-allocator")]
#[command(about = "Income-targeted portfolio allocation under rate and FX scenarios", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory with instruments.csv and the scenario tables
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// JSON file with simulation parameters
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Write the record sequence to a CSV file
    #[arg(long, global = true)]
    csv: Option<PathBuf>,
}

#[derive(Args, Clone)]
struct ScenarioArgs {
    /// Capital-growth scenario
    #[arg(long, default_value = "constant")]
    capital: String,

    /// Central-bank rate scenario
    #[arg(long, default_value = "base")]
    rate: String,

    /// FX scenario
    #[arg(long, default_value = "base")]
    fx: String,
}

impl ScenarioArgs {
    fn key(&self) -> ScenarioKey {
        ScenarioKey::new(&self.capital, &self.rate, &self.fx)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Optimize the allocation for one scenario and project it
    Recommend {
        #[command(flatten)]
        scenario: ScenarioArgs,

        /// Required ratio of monthly income to the target
        #[arg(long, default_value = "1.0")]
        coverage: f64,
    },

    /// Optimize and summarize the standard scenario set
    Compare,

    /// Monthly simulation with periodic re-optimization
    Rebalance {
        #[command(flatten)]
        scenario: ScenarioArgs,

        /// monthly, quarterly, annual or none
        #[arg(long, default_value = "monthly")]
        frequency: String,

        #[arg(long, default_value = "3")]
        years: usize,

        /// Compare every frequency instead of running one
        #[arg(long)]
        all: bool,
    },

    /// Allocation maximizing total income
    MaxProfit {
        #[command(flatten)]
        scenario: ScenarioArgs,

        #[arg(long, default_value = "3")]
        years: usize,

        /// Report every horizon from 1 to --years
        #[arg(long)]
        horizons: bool,
    },

    /// Fixed tier plus a monthly-rebalanced dynamic pair
    TwoTier {
        #[command(flatten)]
        scenario: ScenarioArgs,

        #[arg(long, default_value = "3")]
        years: usize,

        /// Weight of the fixed tier
        #[arg(long, default_value = "0.3")]
        fixed_share: f64,
    },

    /// Coupon schedule statistics and payments for variable-coupon instruments
    Coupons {
        /// Amount invested in each instrument
        #[arg(long, default_value = "800000")]
        investment: f64,
    },
}

/// Flat row for CSV export of a rebalancing run
#[derive(Serialize)]
struct RebalanceRow {
    month: usize,
    year: usize,
    month_in_year: usize,
    capital: f64,
    monthly_income: f64,
    return_pct: f64,
    rebalanced: bool,
    transaction_cost: f64,
    degraded: bool,
    weights: String,
}

impl From<&RebalanceRecord> for RebalanceRow {
    fn from(record: &RebalanceRecord) -> Self {
        let weights = record
            .weights
            .iter()
            .map(|(name, w)| format!("{}={:.4}", name, w))
            .collect::<Vec<_>>()
            .join(";");
        Self {
            month: record.month,
            year: record.year,
            month_in_year: record.month_in_year,
            capital: record.capital,
            monthly_income: record.monthly_income,
            return_pct: record.return_pct,
            rebalanced: record.rebalanced,
            transaction_cost: record.transaction_cost,
            degraded: record.degraded,
            weights,
        }
    }
}

/// Flat row for CSV export of a scenario comparison
#[derive(Serialize)]
struct ComparisonRow<'a> {
    label: &'a str,
    scenario: String,
    average_yield_pct: f64,
    average_monthly_income: f64,
    ending_capital: f64,
    average_coverage: f64,
    degraded: bool,
}

impl<'a> From<&'a ScenarioComparison> for ComparisonRow<'a> {
    fn from(row: &'a ScenarioComparison) -> Self {
        Self {
            label: &row.label,
            scenario: row.key.to_string(),
            average_yield_pct: row.average_yield_pct,
            average_monthly_income: row.average_monthly_income,
            ending_capital: row.ending_capital,
            average_coverage: row.average_coverage,
            degraded: row.degraded,
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<SimulationConfig> {
    let Some(path) = path else {
        return Ok(SimulationConfig::default());
    };
    let file = File::open(path).with_context(|| format!("opening config {}", path.display()))?;
    let config: SimulationConfig = serde_json::from_reader(file)
        .with_context(|| format!("parsing config {}", path.display()))?;
    config.validate().context("invalid simulation config")?;
    Ok(config)
}

fn write_csv<T: Serialize>(path: &Path, rows: impl IntoIterator<Item = T>) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    println!("Records written to: {}", path.display());
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_rebalance_summary(summary: &RebalanceSummary) {
    println!(
        "{:>10} {:>16.0} {:>14.0} {:>8.2}% {:>14.0} {:>6} {:>12.0}",
        summary.frequency.to_string(),
        summary.final_capital,
        summary.profit,
        summary.profit_pct,
        summary.average_monthly_income,
        summary.rebalance_count,
        summary.total_transaction_cost,
    );
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    let runner = match &cli.data {
        Some(dir) => ScenarioRunner::from_csv_path(dir, config)
            .with_context(|| format!("loading assumptions from {}", dir.display()))?,
        None => ScenarioRunner::new(config),
    };
    let target = runner.config().target_monthly_income;

    match &cli.command {
        Commands::Recommend { scenario, coverage } => {
            let outcome = runner.run(&scenario.key(), *coverage)?;
            if let Some(path) = &cli.csv {
                write_csv(path, &outcome.records)?;
            }
            if cli.json {
                return print_json(&outcome);
            }

            println!("Scenario: {}", outcome.key);
            if outcome.allocation.is_degraded() {
                println!("  WARNING: solver did not converge, uniform allocation shown");
            }
            println!();
            println!(
                "{:<24} {:>7} {:>14} {:>12} {:>10} {:>12}",
                "Instrument", "Weight", "Amount", "Foreign", "Yield %", "Monthly"
            );
            println!("{}", "-".repeat(84));
            for line in &outcome.breakdown.lines {
                let foreign = line
                    .foreign_amount
                    .map_or_else(String::new, |units| format!("{:.2}", units));
                println!(
                    "{:<24} {:>6.1}% {:>14.0} {:>12} {:>10.2} {:>12.0}",
                    line.instrument,
                    line.weight * 100.0,
                    line.amount,
                    foreign,
                    line.after_tax_yield_pct,
                    line.monthly_income,
                );
            }
            println!(
                "\nDomestic: {:.0}  Foreign: {:.0}  Monthly income: {:.0} ({:.0}% of target)",
                outcome.breakdown.domestic_total,
                outcome.breakdown.foreign_total,
                outcome.breakdown.monthly_income,
                outcome.breakdown.coverage * 100.0,
            );

            println!("\n{:>4} {:>16} {:>8} {:>14} {:>16}", "Year", "Start", "Yield %", "Monthly", "End");
            for record in &outcome.records {
                println!(
                    "{:>4} {:>16.0} {:>8.2} {:>14.0} {:>16.0}",
                    record.year,
                    record.capital_start,
                    record.portfolio_yield_pct,
                    record.monthly_income,
                    record.capital_end,
                );
            }
            println!("\nVerdict: {:?}", outcome.summary.verdict);
        }

        Commands::Compare => {
            let rows = runner.compare(&default_comparison_set())?;
            if let Some(path) = &cli.csv {
                write_csv(path, rows.iter().map(ComparisonRow::from))?;
            }
            if cli.json {
                return print_json(&rows);
            }

            println!(
                "{:<14} {:>10} {:>16} {:>18} {:>10}",
                "Scenario", "Yield %", "Monthly income", "Ending capital", "Coverage"
            );
            println!("{}", "-".repeat(72));
            for row in &rows {
                println!(
                    "{:<14} {:>10.1} {:>16.0} {:>18.0} {:>9.0}%",
                    row.label,
                    row.average_yield_pct,
                    row.average_monthly_income,
                    row.ending_capital,
                    row.average_coverage * 100.0,
                );
            }
        }

        Commands::Rebalance { scenario, frequency, years, all } => {
            let key = scenario.key();
            if *all {
                let summaries = runner.compare_rebalancing(&key, *years)?;
                if let Some(path) = &cli.csv {
                    write_csv(path, &summaries)?;
                }
                if cli.json {
                    return print_json(&summaries);
                }
                println!(
                    "{:>10} {:>16} {:>14} {:>9} {:>14} {:>6} {:>12}",
                    "Frequency", "Final capital", "Profit", "Profit", "Monthly", "Rebal", "Costs"
                );
                for summary in &summaries {
                    print_rebalance_summary(summary);
                }
                return Ok(());
            }

            let frequency: RebalanceFrequency = frequency.parse()?;
            let records = runner.rebalance(&StrategyKind::PeriodOptimizer, &key, *years, frequency)?;
            let summary =
                RebalanceSummary::from_records(frequency, &records, runner.config().total_capital());
            if let Some(path) = &cli.csv {
                write_csv(path, records.iter().map(RebalanceRow::from))?;
            }
            if cli.json {
                return print_json(&records);
            }
            for record in records.iter().filter(|r| r.rebalanced) {
                println!(
                    "Month {:>3}: capital {:>14.0}, income {:>10.0}, cost {:>8.0}",
                    record.month, record.capital, record.monthly_income, record.transaction_cost
                );
            }
            print_rebalance_summary(&summary);
        }

        Commands::MaxProfit { scenario, years, horizons } => {
            let key = scenario.key();
            let plans = if *horizons {
                runner.compare_horizons(&key, *years)?
            } else {
                vec![runner.max_profit(&key, *years)?]
            };
            if let Some(path) = &cli.csv {
                write_csv(path, plans.iter().flat_map(|p| p.records.iter()))?;
            }
            if cli.json {
                return print_json(&plans);
            }

            for plan in &plans {
                println!(
                    "{} year(s): total income {:.0}, monthly {:.0} ({:.0}% of target), profit {:.2}%",
                    plan.years,
                    plan.total_income,
                    plan.average_monthly_income,
                    plan.average_monthly_income / target * 100.0,
                    plan.profit_pct,
                );
                for (name, weight) in plan.allocation.weights.iter().filter(|(_, w)| *w > 0.001) {
                    println!("    {:<24} {:>6.1}%", name, weight * 100.0);
                }
            }
        }

        Commands::TwoTier { scenario, years, fixed_share } => {
            let policy = TwoTierPolicy {
                fixed_share: *fixed_share,
                ..Default::default()
            };
            let records = runner.rebalance(
                &StrategyKind::TwoTier(policy),
                &scenario.key(),
                *years,
                RebalanceFrequency::Monthly,
            )?;
            let summary = RebalanceSummary::from_records(
                RebalanceFrequency::Monthly,
                &records,
                runner.config().total_capital(),
            );
            if let Some(path) = &cli.csv {
                write_csv(path, records.iter().map(RebalanceRow::from))?;
            }
            if cli.json {
                return print_json(&records);
            }

            for record in records.iter().filter(|r| r.month_in_year == 1) {
                println!(
                    "Year {}: capital {:.0}, monthly income {:.0}",
                    record.year, record.capital, record.monthly_income
                );
            }
            print_rebalance_summary(&summary);
        }

        Commands::Coupons { investment } => {
            let tax_rate = runner.config().tax_rate;
            let variable: Vec<_> = runner
                .assumptions()
                .catalog
                .iter()
                .filter(|i| i.has_variable_coupon())
                .collect();
            if variable.is_empty() {
                bail!("catalog has no variable-coupon instruments");
            }

            let rows = catalog_coupon_payments(&runner.assumptions().catalog, *investment, tax_rate);
            if let Some(path) = &cli.csv {
                write_csv(path, &rows)?;
            }
            if cli.json {
                return print_json(&rows);
            }

            for instrument in variable {
                println!("{}", instrument.name);
                if let Some(stats) = coupon_stats(instrument) {
                    println!(
                        "  {} months, average {:.2}%, min {:.2}%, max {:.2}%, total {:.2}%",
                        stats.months, stats.average_pct, stats.min_pct, stats.max_pct, stats.total_pct
                    );
                }
                for payment in coupon_payments(instrument, *investment, tax_rate) {
                    println!(
                        "  Month {:>2}: {:>5.2}% gross {:>10.0} tax {:>8.0} net {:>10.0} cumulative {:>10.0}",
                        payment.month,
                        payment.coupon_pct,
                        payment.gross,
                        payment.tax,
                        payment.net,
                        payment.cumulative_net,
                    );
                }
            }
        }
    }

    Ok(())
}
