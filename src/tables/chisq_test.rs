use crate::base::*;
use log::debug;
use ndarray::prelude::*;
use statrs::distribution::{ChiSquared, Continuous, ContinuousCDF};
use std::io::{self, Error, ErrorKind};

impl<M: PopulationModel> Tabulate for M {
    // Subpopulations x alleles counts per locus where alleles missing from a subpopulation are counted as zero
    fn contingency_tables(
        &self,
        afs: &AlleleFrequencySpectrum,
    ) -> io::Result<Vec<ContingencyTable>> {
        let counts = self.allele_counts_by_subpopulation()?;
        let l = afs.n_loci();
        let n = counts.len();
        if counts.iter().any(|x| x.len() != l) {
            return Err(Error::new(
                ErrorKind::Other,
                "The number of loci reported by the simulated population does not match the allele frequency spectrum.",
            ));
        }
        let mut out: Vec<ContingencyTable> = Vec::with_capacity(l);
        for j in 0..l {
            let p = afs.n_alleles(j);
            let mut matrix: Array2<u64> = Array2::zeros((n, p));
            for i in 0..n {
                for k in 0..p {
                    matrix[(i, k)] = *counts[i][j].get(&k).unwrap_or(&0);
                }
            }
            out.push(ContingencyTable { locus: j, matrix });
        }
        Ok(out)
    }
}

impl ContingencyTable {
    /// An allele counted zero times in every subpopulation, i.e. lost from the whole population
    pub fn has_lost_allele(&self) -> bool {
        self.matrix
            .sum_axis(Axis(0))
            .iter()
            .any(|&x| x == 0)
    }
}

/// Chi-square test of independence of a contingency table with Yates' continuity correction for 1 degree of freedom
pub fn chisq_contingency(observed: &Array2<u64>) -> io::Result<ChiSquareTest> {
    let (n, p) = observed.dim();
    if (n == 0) || (p == 0) {
        return Err(Error::new(ErrorKind::Other, "Empty contingency table."));
    }
    let dof = (n - 1) * (p - 1);
    let observed = observed.mapv(|x| x as f64);
    let total = observed.sum();
    let row_sums = observed.sum_axis(Axis(1));
    let col_sums = observed.sum_axis(Axis(0));
    let mut expected: Array2<f64> = Array2::zeros((n, p));
    for i in 0..n {
        for j in 0..p {
            expected[(i, j)] = row_sums[i] * col_sums[j] / total;
        }
    }
    if expected.iter().any(|&x| !(x > 0.0)) {
        return Err(Error::new(
            ErrorKind::Other,
            "The contingency table has a zero element in its table of expected frequencies.",
        ));
    }
    if dof == 0 {
        return Ok(ChiSquareTest {
            statistic: 0.0,
            pval: 1.0,
            dof,
        });
    }
    let mut chi2: f64 = 0.0;
    for i in 0..n {
        for j in 0..p {
            let mut o = observed[(i, j)];
            let e = expected[(i, j)];
            if dof == 1 {
                let diff = e - o;
                o += f64::min(0.5, diff.abs()) * diff.signum();
            }
            chi2 += (o - e).powf(2.0) / e;
        }
    }
    let d = match ChiSquared::new(dof as f64) {
        Ok(x) => x,
        Err(_) => {
            return Err(Error::new(
                ErrorKind::Other,
                "Invalid degrees of freedom for the chi-square distribution: ".to_owned() + &dof.to_string(),
            ))
        }
    };
    // Upper tail
    let pval = 1.00 - d.cdf(chi2);
    Ok(ChiSquareTest {
        statistic: chi2,
        pval,
        dof,
    })
}

/// Global detection value from the summed statistics and degrees of freedom; NaN without any degree of freedom.
/// The density at a summed statistic of zero with a single degree of freedom is infinite.
pub fn combined_pvalue(sum_statistic: f64, sum_dof: usize, mode: PvalueMode) -> f64 {
    if sum_dof == 0 {
        return f64::NAN;
    }
    let d = match ChiSquared::new(sum_dof as f64) {
        Ok(x) => x,
        Err(_) => return f64::NAN,
    };
    match mode {
        PvalueMode::Density => d.pdf(sum_statistic),
        PvalueMode::Survival => 1.00 - d.cdf(sum_statistic),
    }
}

/// Chi-square tests across loci. Loci with an allele lost from both subpopulations are dropped, once per locus.
pub fn detection_test(
    tables: &[ContingencyTable],
    mode: PvalueMode,
) -> io::Result<ChiSquareSummary> {
    let mut n_dropped: usize = 0;
    let mut sum_statistic: f64 = 0.0;
    let mut sum_dof: usize = 0;
    for table in tables.iter() {
        if table.has_lost_allele() {
            debug!("Dropping locus {} with a lost allele: {:?}", table.locus, table.matrix);
            n_dropped += 1;
            continue;
        }
        let test = chisq_contingency(&table.matrix)?;
        debug!(
            "Locus {}: chi2={}; pval={}; dof={}",
            table.locus, test.statistic, test.pval, test.dof
        );
        sum_statistic += test.statistic;
        sum_dof += test.dof;
    }
    Ok(ChiSquareSummary {
        n_loci: tables.len(),
        n_dropped,
        sum_statistic,
        sum_dof,
        combined: combined_pvalue(sum_statistic, sum_dof, mode),
    })
}

impl ChiSquareSummary {
    pub fn prop_dropped(&self) -> f64 {
        if self.n_loci == 0 {
            return 0.0;
        }
        self.n_dropped as f64 / self.n_loci as f64
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    // Note this useful idiom: importing names from outer (for mod tests) scope.
    use super::*;
    use std::collections::BTreeMap;

    fn table(locus: usize, n_alleles: usize, counts: Vec<u64>) -> ContingencyTable {
        ContingencyTable {
            locus,
            matrix: Array2::from_shape_vec((2, n_alleles), counts).unwrap(),
        }
    }

    // Fixed allele counts
    struct Counts {
        counts: Vec<Vec<BTreeMap<usize, u64>>>,
    }

    impl PopulationModel for Counts {
        fn n_loci(&self) -> usize {
            self.counts[0].len()
        }
        fn subpopulation_sizes(&self) -> Vec<usize> {
            vec![0, 0]
        }
        fn evolve_one_generation(&mut self) -> io::Result<&mut Self> {
            Ok(self)
        }
        fn current_fst(&self) -> io::Result<f64> {
            Ok(0.0)
        }
        fn allele_counts_by_subpopulation(&self) -> io::Result<Vec<Vec<BTreeMap<usize, u64>>>> {
            Ok(self.counts.clone())
        }
    }

    #[test]
    fn test_contingency_tables() {
        let afs = AlleleFrequencySpectrum {
            frequencies: vec![vec![0.5, 0.5], vec![0.2, 0.3, 0.5]],
        };
        let sp1 = vec![
            BTreeMap::from([(0, 12), (1, 8)]),
            BTreeMap::from([(2, 20)]),
        ];
        let sp2 = vec![
            BTreeMap::from([(1, 20)]),
            BTreeMap::from([(0, 5), (2, 15)]),
        ];
        let model = Counts {
            counts: vec![sp1, sp2],
        };
        let tables = model.contingency_tables(&afs).unwrap();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].matrix, Array2::from_shape_vec((2, 2), vec![12, 8, 0, 20]).unwrap());
        assert_eq!(tables[1].matrix, Array2::from_shape_vec((2, 3), vec![0, 0, 20, 5, 0, 15]).unwrap());
        assert!(!tables[0].has_lost_allele());
        assert!(tables[1].has_lost_allele());
        // Mismatched number of loci
        let afs = AlleleFrequencySpectrum {
            frequencies: vec![vec![0.5, 0.5]],
        };
        assert!(model.contingency_tables(&afs).is_err());
    }

    #[test]
    fn test_chisq_contingency() {
        // 2x2 with Yates' correction
        let x = Array2::from_shape_vec((2, 2), vec![10, 20, 30, 40]).unwrap();
        let test = chisq_contingency(&x).unwrap();
        assert_eq!(test.dof, 1);
        assert!(f64::abs(test.statistic - 0.4464285714285714) < 1e-9);
        assert!((test.pval > 0.50) && (test.pval < 0.51));
        // 2x3 without correction: chi2 = 16/3 and the upper tail of df=2 is exp(-chi2/2)
        let x = Array2::from_shape_vec((2, 3), vec![10, 20, 30, 20, 20, 20]).unwrap();
        let test = chisq_contingency(&x).unwrap();
        assert_eq!(test.dof, 2);
        assert!(f64::abs(test.statistic - 16.0 / 3.0) < 1e-9);
        assert!(f64::abs(test.pval - f64::exp(-8.0 / 3.0)) < 1e-6);
        // Single allele
        let x = Array2::from_shape_vec((2, 1), vec![40, 40]).unwrap();
        assert_eq!(
            chisq_contingency(&x).unwrap(),
            ChiSquareTest {
                statistic: 0.0,
                pval: 1.0,
                dof: 0
            }
        );
        // Zero expected counts
        let x = Array2::from_shape_vec((2, 2), vec![10, 0, 30, 0]).unwrap();
        assert!(chisq_contingency(&x).is_err());
    }

    #[test]
    fn test_combined_pvalue() {
        let x: f64 = 16.0 / 3.0;
        let density = combined_pvalue(x, 2, PvalueMode::Density);
        let survival = combined_pvalue(x, 2, PvalueMode::Survival);
        assert!(f64::abs(density - 0.5 * f64::exp(-x / 2.0)) < 1e-6);
        assert!(f64::abs(survival - f64::exp(-x / 2.0)) < 1e-6);
        assert!(combined_pvalue(0.0, 0, PvalueMode::Density).is_nan());
        assert!(combined_pvalue(0.0, 0, PvalueMode::Survival).is_nan());
        // Identical subpopulations at a single biallelic locus
        let summary = detection_test(&[table(0, 2, vec![10, 10, 10, 10])], PvalueMode::Density).unwrap();
        assert_eq!(summary.sum_statistic, 0.0);
        assert_eq!(summary.sum_dof, 1);
        assert!(summary.combined.is_infinite());
        let summary = detection_test(&[table(0, 2, vec![10, 10, 10, 10])], PvalueMode::Survival).unwrap();
        assert_eq!(summary.combined, 1.0);
    }

    #[test]
    fn test_detection_test() {
        let tables = vec![
            // Retained
            table(0, 2, vec![10, 20, 30, 40]),
            // Two alleles lost at a triallelic locus is one dropped locus
            table(1, 3, vec![20, 0, 0, 20, 0, 0]),
            // Retained triallelic
            table(2, 3, vec![10, 20, 30, 20, 20, 20]),
            // One allele lost from both
            table(3, 2, vec![0, 40, 0, 40]),
            // Lost from one subpopulation only is retained
            table(4, 2, vec![0, 40, 10, 30]),
        ];
        let summary = detection_test(&tables, PvalueMode::Density).unwrap();
        assert_eq!(summary.n_loci, 5);
        assert_eq!(summary.n_dropped, 2);
        assert_eq!(summary.prop_dropped(), 0.4);
        assert_eq!(summary.sum_dof, 4);
        assert!(summary.sum_statistic > 0.4464285714285714 + 16.0 / 3.0);
        let without_last = detection_test(&tables[0..4], PvalueMode::Density).unwrap();
        assert!(f64::abs(without_last.sum_statistic - (0.4464285714285714 + 16.0 / 3.0)) < 1e-9);
        assert!(summary.combined.is_finite());
        // Everything dropped
        let summary = detection_test(&tables[1..2], PvalueMode::Survival).unwrap();
        assert_eq!(summary.prop_dropped(), 1.0);
        assert_eq!(summary.sum_dof, 0);
        assert!(summary.combined.is_nan());
    }
}
