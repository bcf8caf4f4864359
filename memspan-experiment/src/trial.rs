use crate::config::{ExperimentConfig, StimulusPool};
use crate::error::TrialError;
use crate::matrix::{Border, Matrix, MatrixGeometry};
use memspan_core::TrialDescriptor;
use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};

/// Area covered by the mask after the study display
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaskRect {
    pub pos: (f32, f32),
    pub size: (f32, f32),
}

/// One study/mask/response triple
#[derive(Debug, Clone)]
pub struct Trial {
    pub descriptor: TrialDescriptor,
    pub study: Matrix,
    pub response: Matrix,
    pub mask: MaskRect,
}

impl Trial {
    /// Lays out both matrices and the mask, without content.
    pub fn new<R: Rng + ?Sized>(
        config: &ExperimentConfig,
        descriptor: TrialDescriptor,
        rng: &mut R,
    ) -> Result<Self, TrialError> {
        let geometry = MatrixGeometry::from_config(config, descriptor.size);
        let study = Matrix::new(geometry, descriptor.n, descriptor.group_elements, rng)?;
        let response = Matrix::new(
            geometry,
            descriptor.size.cells(),
            descriptor.group_elements,
            rng,
        )?;

        let (w, h) = geometry.extent();
        let mask = MaskRect {
            pos: config.mask_pos,
            size: (w + config.extra_mask_size, h + config.extra_mask_size),
        };

        Ok(Self {
            descriptor,
            study,
            response,
            mask,
        })
    }

    /// Builds a trial and fills it from the pool: the response grid gets one
    /// identity per cell, the study grid `n` of those.
    pub fn sample<R: Rng + ?Sized>(
        config: &ExperimentConfig,
        descriptor: TrialDescriptor,
        pool: &StimulusPool,
        rng: &mut R,
    ) -> Result<Self, TrialError> {
        let (response_ids, study_ids) = sample_identities(&pool.identities, descriptor, rng)?;
        let mut trial = Self::new(config, descriptor, rng)?;

        let border = Border {
            width: config.stimulus_border_width,
            color: config.stimulus_border_color,
        };
        trial.study.prepare_to_draw(&study_ids, pool.kind, border)?;
        trial
            .response
            .prepare_to_draw(&response_ids, pool.kind, border)?;
        Ok(trial)
    }
}

/// Draws `cells` identities without replacement, then `n` of those.
/// Both lists come back in random order.
pub fn sample_identities<R: Rng + ?Sized>(
    pool: &[String],
    descriptor: TrialDescriptor,
    rng: &mut R,
) -> Result<(Vec<String>, Vec<String>), TrialError> {
    let cells = descriptor.size.cells();
    if pool.len() < cells {
        return Err(TrialError::PoolTooSmall {
            needed: cells,
            available: pool.len(),
        });
    }

    let mut response: Vec<String> = pool.choose_multiple(rng, cells).cloned().collect();
    response.shuffle(rng);
    let mut study: Vec<String> = response
        .choose_multiple(rng, descriptor.n.min(cells))
        .cloned()
        .collect();
    study.shuffle(rng);
    Ok((response, study))
}

#[cfg(test)]
mod tests {
    use super::*;
    use memspan_core::{GridSize, StimulusKind};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn pool(n: usize) -> StimulusPool {
        StimulusPool {
            kind: StimulusKind::Text,
            identities: (0..n).map(|i| format!("s{i}")).collect(),
        }
    }

    fn descriptor(n: usize, rows: usize, cols: usize) -> TrialDescriptor {
        TrialDescriptor {
            n,
            size: GridSize::new(rows, cols),
            group_elements: false,
        }
    }

    #[test]
    fn study_set_is_subset_of_response_set() {
        let mut rng = StdRng::seed_from_u64(9);
        let pool = pool(30);
        for _ in 0..100 {
            let (response, study) =
                sample_identities(&pool.identities, descriptor(4, 3, 3), &mut rng).unwrap();
            let response_set: HashSet<_> = response.iter().collect();
            let study_set: HashSet<_> = study.iter().collect();
            assert_eq!(response_set.len(), 9);
            assert_eq!(study_set.len(), 4);
            assert!(study_set.is_subset(&response_set));
        }
    }

    #[test]
    fn pool_smaller_than_grid_is_an_error() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            sample_identities(&pool(8).identities, descriptor(2, 3, 3), &mut rng),
            Err(TrialError::PoolTooSmall {
                needed: 9,
                available: 8
            })
        );
    }

    #[test]
    fn sampled_trial_matches_descriptor() {
        let mut rng = StdRng::seed_from_u64(4);
        let config = ExperimentConfig {
            stimulus_dist: 100.0,
            stimulus_size: 80.0,
            extra_mask_size: 20.0,
            mask_pos: (5.0, 5.0),
            ..ExperimentConfig::default()
        };
        let trial = Trial::sample(&config, descriptor(3, 2, 3), &pool(12), &mut rng).unwrap();

        assert_eq!(trial.study.n(), 3);
        assert_eq!(trial.study.size(), GridSize::new(2, 3));
        assert_eq!(trial.response.n(), 6);
        assert_eq!(trial.response.stimuli().len(), 6);
        assert!(trial.study.is_prepared() && trial.response.is_prepared());

        let response: HashSet<_> = trial.response.identities().into_iter().collect();
        assert!(trial.study.identities().iter().all(|id| response.contains(id)));

        assert_eq!(trial.mask.pos, (5.0, 5.0));
        assert_eq!(trial.mask.size, (300.0, 200.0));
    }
}
