use ndarray::prelude::*;
use std::io::{self, Error, ErrorKind};

/// Multi-allelic, multi-locus Fst of [Weir & Cockerham, 1984](https://doi.org/10.2307/2408641) from diploid genotypes,
/// i.e. the ratio of the sums of the among-subpopulation variance component over all alleles and loci to the sums of the total variance.
/// Each subpopulation is an individuals x loci x 2 array of allele indices.
/// Returns 0.0 when every locus carries the same single allele in all subpopulations.
pub fn weir_cockerham_fst(genotypes: &[ArrayView3<u16>], n_alleles: &[usize]) -> io::Result<f64> {
    let r = genotypes.len();
    if r < 2 {
        return Err(Error::new(
            ErrorKind::Other,
            "Fst needs at least two subpopulations.",
        ));
    }
    let l = n_alleles.len();
    let sizes = genotypes.iter().map(|x| x.dim().0).collect::<Vec<usize>>();
    for g in genotypes.iter() {
        if g.dim().1 != l {
            return Err(Error::new(
                ErrorKind::Other,
                "The number of loci in the genotypes and in the number of alleles per locus do not match.",
            ));
        }
    }
    let n: Array1<f64> = sizes.iter().map(|&x| x as f64).collect();
    let r_f64 = r as f64;
    let n_bar = n.sum() / r_f64;
    if n_bar <= 1.0 || sizes.contains(&0) {
        return Err(Error::new(
            ErrorKind::Other,
            "Fst needs more than one individual per subpopulation on average and no empty subpopulation.",
        ));
    }
    let n_c = (r_f64 * n_bar - n.fold(0.0, |sum, &x| sum + x.powf(2.0)) / (r_f64 * n_bar)) / (r_f64 - 1.0);
    let mut numerator: f64 = 0.0;
    let mut denominator: f64 = 0.0;
    for j in 0..l {
        // Allele frequencies and frequencies of heterozygotes carrying each allele per subpopulation
        let mut p: Array2<f64> = Array2::zeros((r, n_alleles[j]));
        let mut h: Array2<f64> = Array2::zeros((r, n_alleles[j]));
        for (i, g) in genotypes.iter().enumerate() {
            for ind in 0..sizes[i] {
                let a = g[(ind, j, 0)] as usize;
                let b = g[(ind, j, 1)] as usize;
                if (a >= n_alleles[j]) || (b >= n_alleles[j]) {
                    return Err(Error::new(
                        ErrorKind::Other,
                        "Allele index out of bounds at locus ".to_owned() + &j.to_string() + ".",
                    ));
                }
                p[(i, a)] += 1.0;
                p[(i, b)] += 1.0;
                if a != b {
                    h[(i, a)] += 1.0;
                    h[(i, b)] += 1.0;
                }
            }
            let mut p_i = p.row_mut(i);
            p_i /= 2.0 * n[i];
            let mut h_i = h.row_mut(i);
            h_i /= n[i];
        }
        for u in 0..n_alleles[j] {
            let p_u = p.column(u);
            let h_u = h.column(u);
            let p_bar = (&n * &p_u).sum() / (r_f64 * n_bar);
            let s2 = (&n * &p_u.mapv(|x| (x - p_bar).powf(2.0))).sum() / ((r_f64 - 1.0) * n_bar);
            let h_bar = (&n * &h_u).sum() / (r_f64 * n_bar);
            let pq = p_bar * (1.0 - p_bar);
            let a = (n_bar / n_c)
                * (s2 - (1.0 / (n_bar - 1.0)) * (pq - ((r_f64 - 1.0) / r_f64) * s2 - 0.25 * h_bar));
            let b = (n_bar / (n_bar - 1.0))
                * (pq - ((r_f64 - 1.0) / r_f64) * s2 - ((2.0 * n_bar - 1.0) / (4.0 * n_bar)) * h_bar);
            let c = 0.5 * h_bar;
            numerator += a;
            denominator += a + b + c;
        }
    }
    if denominator.abs() < f64::EPSILON {
        // Monomorphic for the same allele across all subpopulations
        return Ok(0.0);
    }
    Ok(numerator / denominator)
}
