use ndarray::prelude::*;
use rand::rngs::StdRng;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter};
use std::time::Instant;

///////////////////////////////////////////////////////////////////////////////
// STRUCTS
///////////////////////////////////////////////////////////////////////////////
///
#[derive(Debug, Clone)]
pub struct FileAfs {
    pub filename: String,
}

#[derive(Debug, Clone)]
pub struct FileParams {
    pub filename: String,
}

// Empirical allele frequency spectrum: one vector of allele frequencies per locus
#[derive(Debug, Clone, PartialEq)]
pub struct AlleleFrequencySpectrum {
    pub frequencies: Vec<Vec<f64>>, // loci x alleles (variable number of alleles per locus)
}

// The four parameter sequences swept across
#[derive(Debug, Clone, PartialEq)]
pub struct SweepParameters {
    pub reps: usize,                 // upper bound of the replicate loop
    pub popsizes: Vec<usize>,        // individuals per subpopulation
    pub migrates: Vec<f64>,          // probability of drawing a parent from the migrant pool
    pub genss: Vec<usize>,           // generations of drift
}

// Composite key into the sweep: positions into the parameter sequences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SweepKey {
    pub rep: usize,
    pub popsize_idx: usize,
    pub migrate_idx: usize,
    pub gens_idx: usize,
}

// One combination of the sweep, i.e. a single simulation run
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub key: SweepKey,
    pub index: usize, // position in the enumeration order
    pub rep: usize,
    pub popsize: usize,
    pub migration_rate: f64,
    pub generations: usize,
}

// Per-locus 2 x K table of allele counts (subpopulations x alleles)
#[derive(Debug, Clone, PartialEq)]
pub struct ContingencyTable {
    pub locus: usize,
    pub matrix: Array2<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChiSquareTest {
    pub statistic: f64,
    pub pval: f64,
    pub dof: usize,
}

// Detection test aggregated across loci for one combination
#[derive(Debug, Clone, PartialEq)]
pub struct ChiSquareSummary {
    pub n_loci: usize,
    pub n_dropped: usize,
    pub sum_statistic: f64,
    pub sum_dof: usize,
    pub combined: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepRecord {
    pub scenario: Scenario,
    pub fst: f64,
    pub chi2_pval: f64,
    pub prop_dropped: f64,
}

// Flat results store in enumeration order with a composite key index
#[derive(Debug, Clone, Default)]
pub struct ResultsStore {
    pub records: Vec<SweepRecord>,
    pub index: BTreeMap<SweepKey, usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PvalueMode {
    Density,  // probability density at the summed statistic
    Survival, // upper tail, i.e. 1 - cdf
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NanPolicy {
    Warn,
    Sentinel,
    Omit,
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sex {
    Male,
    Female,
}

// A subpopulation of diploid individuals
#[derive(Debug, Clone, PartialEq)]
pub struct Deme {
    pub name: String,
    pub genotypes: Array3<u16>, // individuals x loci x 2 allele copies
    pub sexes: Vec<Sex>,
}

// Two demes exchanging migrants under random mating
#[derive(Debug, Clone)]
pub struct TwoDemePopulation {
    pub demes: Vec<Deme>,
    pub n_alleles: Vec<usize>, // number of alleles per locus
    pub migration_rate: f64,
    pub generation: usize,
    pub rng: StdRng,
}

// Timestamped progress mirrored to stdout and the log file
#[derive(Debug)]
pub struct ProgressLog {
    pub filename: String,
    pub writer: BufWriter<File>,
    pub start: Instant,
}

// Tab-delimited results appended one combination at a time
#[derive(Debug)]
pub struct ResultsFile {
    pub filename: String,
    pub writer: BufWriter<File>,
    pub n_rows: usize,
}

#[derive(Debug, Clone)]
pub struct SweepSettings {
    pub output_prefix: String,
    pub seed: u64,
    pub pvalue_mode: PvalueMode,
    pub nan_policy: NanPolicy,
}

///////////////////////////////////////////////////////////////////////////////
// TRAITS
///////////////////////////////////////////////////////////////////////////////

pub trait Parse<T> {
    fn lparse(&self) -> io::Result<Box<T>>;
}

/// Two-subpopulation simulation engine driven one generation at a time by the sweep
pub trait PopulationModel {
    fn n_loci(&self) -> usize;
    fn subpopulation_sizes(&self) -> Vec<usize>;
    fn evolve_one_generation(&mut self) -> io::Result<&mut Self>;
    fn current_fst(&self) -> io::Result<f64>;
    /// Allele counts per subpopulation per locus; alleles absent from a subpopulation may be missing from the map
    fn allele_counts_by_subpopulation(&self) -> io::Result<Vec<Vec<BTreeMap<usize, u64>>>>;
}

pub trait Tabulate {
    fn contingency_tables(
        &self,
        afs: &AlleleFrequencySpectrum,
    ) -> io::Result<Vec<ContingencyTable>>;
}
