use clap::Parser;
use rand::Rng;
use std::io;
mod base;
mod popgen;
mod simulation;
mod sweep;
mod tables;

// Instatiate arguments struct
#[derive(Parser, Debug)]
#[clap(version="0.1.0",
       about="Simulate migration and drift between two subpopulations to find which Fst values are reached and how easily a chi-square test detects them.",
       long_about="Simulate migration and drift between two subpopulations across a sweep of population sizes, migration rates and generations of drift, starting from empirical allele frequencies, then measure Fst and the power to detect differentiation with chi-square tests across loci.")]
struct Args {
    /// Allele frequency file: one locus per line with the number of alleles followed by the frequency of each allele
    #[clap(short, long)]
    afs: String,
    /// Parameter file: one line each for the number of replicates, population sizes, migration rates and generations of drift ('#' for comments). A migration rate m is the probability of drawing each parent from both subpopulations pooled, so about m/2 of the parents come from the other subpopulation
    #[clap(short, long)]
    params: String,
    /// Prefix of the output files, i.e. <output>_log.txt and <output>_globFstChi2_results.txt
    #[clap(short, long)]
    output: String,
    /// Random seed of the simulations (drawn at random and written into the log file if omitted)
    #[clap(long)]
    seed: Option<u64>,
    /// Combined chi-square value: "density" (probability density at the summed statistic) or "survival" (upper tail p-value)
    #[clap(long, default_value="density")]
    pvalue_mode: String,
    /// What to do with combinations yielding a NaN combined chi-square value: "warn", "sentinel" (write NA), "omit" or "abort"
    #[clap(long, default_value="warn")]
    nan_policy: String,
}

fn main() -> io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();
    // Check the modes before anything runs
    let settings = base::SweepSettings {
        output_prefix: args.output,
        seed: match args.seed {
            Some(x) => x,
            None => rand::thread_rng().gen(),
        },
        pvalue_mode: base::parse_pvalue_mode(&args.pvalue_mode)?,
        nan_policy: base::parse_nan_policy(&args.nan_policy)?,
    };
    let file_afs = base::FileAfs { filename: args.afs };
    let file_params = base::FileParams { filename: args.params };
    let (fname_results, fname_log) = sweep::simulate_sweep(&file_afs, &file_params, &settings)?;
    println!("{}", fname_results);
    println!("{}", fname_log);
    Ok(())
}
