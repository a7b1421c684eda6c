use crate::base::*;
use crate::sweep::*;
use crate::tables::*;
use log::{debug, info};
use std::io::{self, Error, ErrorKind};

// Print the progress markers of the sweep levels that changed since the previous combination
fn log_levels(
    log: &mut ProgressLog,
    previous: Option<&Scenario>,
    scenario: &Scenario,
) -> io::Result<()> {
    let depth = match previous {
        None => 0,
        Some(p) if p.key.rep != scenario.key.rep => 0,
        Some(p) if p.key.popsize_idx != scenario.key.popsize_idx => 1,
        Some(p) if p.key.migrate_idx != scenario.key.migrate_idx => 2,
        Some(_) => 3,
    };
    if depth == 0 {
        log.level(0, "rep", &scenario.rep.to_string())?;
    }
    if depth <= 1 {
        log.level(1, "popsize", &scenario.popsize.to_string())?;
    }
    if depth <= 2 {
        log.level(2, "migrate", &scenario.migration_rate.to_string())?;
    }
    log.level(3, "gens", &scenario.generations.to_string())
}

/// Simulate a single combination: fresh population, drift for the requested generations, Fst and the chi-square detection test
pub fn simulate_scenario<M, F>(
    afs: &AlleleFrequencySpectrum,
    scenario: &Scenario,
    pvalue_mode: PvalueMode,
    new_population: &mut F,
) -> io::Result<SweepRecord>
where
    M: PopulationModel,
    F: FnMut(&Scenario) -> io::Result<M>,
{
    let mut population = new_population(scenario)?;
    if population.n_loci() != afs.n_loci() {
        return Err(Error::new(
            ErrorKind::Other,
            "The simulated population does not carry the same number of loci as the allele frequency spectrum.",
        ));
    }
    for g in 0..scenario.generations {
        population.evolve_one_generation()?;
        debug!(
            "Generation {}: subpopulation sizes {:?}",
            g + 1,
            population.subpopulation_sizes()
        );
    }
    let fst = population.current_fst()?;
    let tables = population.contingency_tables(afs)?;
    let summary = detection_test(&tables, pvalue_mode)?;
    Ok(SweepRecord {
        scenario: scenario.clone(),
        fst,
        chi2_pval: summary.combined,
        prop_dropped: summary.prop_dropped(),
    })
}

/// Run every combination in enumeration order, appending each row to the results file as soon as it is done
pub fn run_sweep<M, F>(
    afs: &AlleleFrequencySpectrum,
    params: &SweepParameters,
    settings: &SweepSettings,
    log: &mut ProgressLog,
    results_file: &mut ResultsFile,
    mut new_population: F,
) -> io::Result<ResultsStore>
where
    M: PopulationModel,
    F: FnMut(&Scenario) -> io::Result<M>,
{
    let mut store = ResultsStore::new();
    let scenarios = params.scenarios();
    for (i, scenario) in scenarios.iter().enumerate() {
        log_levels(log, if i > 0 { Some(&scenarios[i - 1]) } else { None }, scenario)?;
        let record = simulate_scenario(afs, scenario, settings.pvalue_mode, &mut new_population)?;
        info!(
            "rep={}; popsize={}; migrate={}; gens={}; fst={}; chi2_pval={}; prop_dropped={}",
            scenario.rep,
            scenario.popsize,
            scenario.migration_rate,
            scenario.generations,
            record.fst,
            record.chi2_pval,
            record.prop_dropped
        );
        let record = store.insert(record)?;
        let mut write_row = true;
        // Infinite densities (summed statistic of zero with one degree of freedom) are flagged like NaN
        if !record.chi2_pval.is_finite() {
            let message = format!(
                "NaN alert! The combined chi-square value of rep {}, popsize {}, migrate {}, gens {} is not a finite number (all {} loci dropped, no degrees of freedom left or an infinite density), this will cause downstream issues.",
                scenario.rep,
                scenario.popsize,
                scenario.migration_rate,
                scenario.generations,
                afs.n_loci()
            );
            match settings.nan_policy {
                NanPolicy::Abort => return Err(Error::new(ErrorKind::Other, message)),
                NanPolicy::Omit => {
                    log.warn(&(message + " Row omitted."))?;
                    write_row = false;
                }
                NanPolicy::Sentinel => {
                    log.warn(&(message + " Written as " + NAN_SENTINEL + "."))?;
                }
                NanPolicy::Warn => log.warn(&message)?,
            }
        }
        if write_row {
            results_file.append(record, settings.nan_policy)?;
        }
    }
    store.check_complete(params)?;
    Ok(store)
}

/// Sweep with the built-in two-deme simulation, returning the names of the results and log files
pub fn simulate_sweep(
    file_afs: &FileAfs,
    file_params: &FileParams,
    settings: &SweepSettings,
) -> io::Result<(String, String)> {
    let params = file_params.lparse()?;
    let afs = file_afs.lparse()?;
    let mut log = ProgressLog::new(&settings.output_prefix)?;
    log.start_time()?;
    log.parameters(&params, settings, afs.n_loci())?;
    let mut results_file = ResultsFile::new(&settings.output_prefix)?;
    let seed = settings.seed;
    run_sweep(
        &afs,
        &params,
        settings,
        &mut log,
        &mut results_file,
        |scenario: &Scenario| {
            TwoDemePopulation::initialise(
                &afs,
                scenario.popsize,
                scenario.migration_rate,
                seed.wrapping_add(scenario.index as u64),
            )
        },
    )?;
    info!("Wrote {} rows into {}", results_file.n_rows, results_file.filename);
    log.finish()?;
    Ok((results_file.filename, log.filename))
}
