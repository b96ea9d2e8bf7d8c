//! Genome data model.
//!
//! ```text
//! Gene -> Chromosome -> Genotype -> Phenotype -> Population
//!                                        \-> Species -> Ecosystem
//! ```

pub mod chromosome;
pub mod gene;
pub mod phenotype;
pub mod population;

pub use chromosome::{Chromosome, Genotype};
pub use gene::{CharGene, FloatGene, Gene, GeneType, IntGene, OpaqueGene, PermutationGene};
pub use phenotype::{Phenotype, Score};
pub use population::{Ecosystem, Population, Species};
