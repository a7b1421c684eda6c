use crate::base::*;
use crate::popgen::weir_cockerham_fst;
use ndarray::prelude::*;
use rand::distributions::{Distribution, WeightedIndex};
use rand::prelude::*;
use rand::rngs::StdRng;
use std::collections::BTreeMap;
use std::io::{self, Error, ErrorKind};

pub const SUBPOPULATION_NAMES: [&str; 2] = ["sp1", "sp2"];

impl Deme {
    pub fn size(&self) -> usize {
        self.sexes.len()
    }

    fn parents_of_sex(&self, sex: Sex) -> Vec<usize> {
        self.sexes
            .iter()
            .enumerate()
            .filter(|(_, s)| **s == sex)
            .map(|(i, _)| i)
            .collect()
    }
}

// Parents of the required sex, or every individual of the source once that sex has been lost
fn or_everyone<T: Clone>(of_sex: Vec<T>, everyone: &[T]) -> Vec<T> {
    if of_sex.is_empty() {
        everyone.to_vec()
    } else {
        of_sex
    }
}

// (deme, individual) pairs across both demes
fn pooled(per_deme: &[Vec<usize>]) -> Vec<(usize, usize)> {
    per_deme
        .iter()
        .enumerate()
        .flat_map(|(d, x)| x.iter().map(move |&i| (d, i)))
        .collect()
}

fn random_sex(rng: &mut StdRng) -> Sex {
    if rng.gen_bool(0.5) {
        Sex::Male
    } else {
        Sex::Female
    }
}

impl TwoDemePopulation {
    /// Two subpopulations of `popsize` individuals with every allele copy drawn from the empirical allele frequencies,
    /// independently per locus and per subpopulation. Sexes are assigned at random.
    pub fn initialise(
        afs: &AlleleFrequencySpectrum,
        popsize: usize,
        migration_rate: f64,
        seed: u64,
    ) -> io::Result<Self> {
        if popsize == 0 {
            return Err(Error::new(
                ErrorKind::Other,
                "Cannot simulate subpopulations of size zero.",
            ));
        }
        if !(0.0..=1.0).contains(&migration_rate) {
            return Err(Error::new(
                ErrorKind::Other,
                "Migration rate must be a probability, got: ".to_owned() + &migration_rate.to_string(),
            ));
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let l = afs.n_loci();
        let mut samplers: Vec<WeightedIndex<f64>> = Vec::with_capacity(l);
        for (j, freqs) in afs.frequencies.iter().enumerate() {
            match WeightedIndex::new(freqs) {
                Ok(x) => samplers.push(x),
                Err(_) => {
                    return Err(Error::new(
                        ErrorKind::Other,
                        "Cannot initialise locus ".to_owned() + &j.to_string() + " from allele frequencies: " + &join_f64(freqs, " "),
                    ))
                }
            };
        }
        let mut demes: Vec<Deme> = Vec::with_capacity(SUBPOPULATION_NAMES.len());
        for name in SUBPOPULATION_NAMES {
            let mut genotypes: Array3<u16> = Array3::zeros((popsize, l, 2));
            for i in 0..popsize {
                for j in 0..l {
                    for k in 0..2 {
                        genotypes[(i, j, k)] = samplers[j].sample(&mut rng) as u16;
                    }
                }
            }
            demes.push(Deme {
                name: name.to_owned(),
                genotypes,
                sexes: vec![],
            });
        }
        for deme in demes.iter_mut() {
            deme.sexes = (0..popsize).map(|_| random_sex(&mut rng)).collect();
        }
        Ok(TwoDemePopulation {
            demes,
            n_alleles: afs.frequencies.iter().map(|x| x.len()).collect(),
            migration_rate,
            generation: 0,
            rng,
        })
    }

    // Draw a parent of the given sex either from its own deme or, with probability m, from the migrant pool (both demes).
    // The pool includes the parent's own deme, so only about m/2 of the parents come from the other deme.
    fn choose_parent(&mut self, deme: usize, sex: Sex, own: &[Vec<usize>], pool: &[(usize, usize)]) -> io::Result<(usize, usize)> {
        let migrant = (self.migration_rate > 0.0) && self.rng.gen_bool(self.migration_rate);
        let parent = if migrant {
            pool.choose(&mut self.rng).copied()
        } else {
            own[deme].choose(&mut self.rng).map(|&i| (deme, i))
        };
        match parent {
            Some(x) => Ok(x),
            None => Err(Error::new(
                ErrorKind::Other,
                format!(
                    "Random mating failed in generation {}: no {} parent available for subpopulation {}.",
                    self.generation,
                    if sex == Sex::Male { "male" } else { "female" },
                    self.demes[deme].name
                ),
            )),
        }
    }
}

impl PopulationModel for TwoDemePopulation {
    fn n_loci(&self) -> usize {
        self.n_alleles.len()
    }

    fn subpopulation_sizes(&self) -> Vec<usize> {
        self.demes.iter().map(|x| x.size()).collect()
    }

    fn evolve_one_generation(&mut self) -> io::Result<&mut Self> {
        let l = self.n_loci();
        let everyone = self.demes.iter().map(|x| (0..x.size()).collect()).collect::<Vec<Vec<usize>>>();
        let pool_everyone = pooled(&everyone);
        let males = self.demes.iter().map(|x| x.parents_of_sex(Sex::Male)).collect::<Vec<Vec<usize>>>();
        let females = self.demes.iter().map(|x| x.parents_of_sex(Sex::Female)).collect::<Vec<Vec<usize>>>();
        // Demes (and the pool) left with a single sex still reproduce
        let pool_males = or_everyone(pooled(&males), &pool_everyone);
        let pool_females = or_everyone(pooled(&females), &pool_everyone);
        let males = males
            .into_iter()
            .zip(everyone.iter())
            .map(|(x, e)| or_everyone(x, e))
            .collect::<Vec<Vec<usize>>>();
        let females = females
            .into_iter()
            .zip(everyone.iter())
            .map(|(x, e)| or_everyone(x, e))
            .collect::<Vec<Vec<usize>>>();
        let mut offspring: Vec<Deme> = Vec::with_capacity(self.demes.len());
        for d in 0..self.demes.len() {
            // Constant subpopulation sizes
            let n = self.demes[d].size();
            let mut genotypes: Array3<u16> = Array3::zeros((n, l, 2));
            let mut sexes: Vec<Sex> = Vec::with_capacity(n);
            for i in 0..n {
                let (father_deme, father) = self.choose_parent(d, Sex::Male, &males, &pool_males)?;
                let (mother_deme, mother) = self.choose_parent(d, Sex::Female, &females, &pool_females)?;
                // Free recombination: one random copy per locus from each parent
                for j in 0..l {
                    let kf = self.rng.gen_range(0..2);
                    let km = self.rng.gen_range(0..2);
                    genotypes[(i, j, 0)] = self.demes[father_deme].genotypes[(father, j, kf)];
                    genotypes[(i, j, 1)] = self.demes[mother_deme].genotypes[(mother, j, km)];
                }
                sexes.push(random_sex(&mut self.rng));
            }
            offspring.push(Deme {
                name: self.demes[d].name.clone(),
                genotypes,
                sexes,
            });
        }
        self.demes = offspring;
        self.generation += 1;
        Ok(self)
    }

    fn current_fst(&self) -> io::Result<f64> {
        let genotypes = self.demes.iter().map(|x| x.genotypes.view()).collect::<Vec<ArrayView3<u16>>>();
        weir_cockerham_fst(&genotypes, &self.n_alleles)
    }

    fn allele_counts_by_subpopulation(&self) -> io::Result<Vec<Vec<BTreeMap<usize, u64>>>> {
        let l = self.n_loci();
        let mut out: Vec<Vec<BTreeMap<usize, u64>>> = Vec::with_capacity(self.demes.len());
        for deme in self.demes.iter() {
            let mut counts: Vec<BTreeMap<usize, u64>> = vec![BTreeMap::new(); l];
            for j in 0..l {
                for &allele in deme.genotypes.slice(s![.., j, ..]).iter() {
                    *counts[j].entry(allele as usize).or_insert(0) += 1;
                }
            }
            out.push(counts);
        }
        Ok(out)
    }
}
