//! Building transitions, with or without absorbing-state wrapping.
//!
//! An episode that terminates for a reason other than a time limit is followed
//! by an absorbing state: observations and actions get one extra indicator
//! entry, `0` for real states and `1` for the absorbing one, and a synthetic
//! absorbing-to-absorbing transition is stored after the terminal one.
//! The unwrapped values are kept in the `*_orig` fields.
use crate::{
    error::{ReplayError, Result},
    replay_buffer::{
        schema::{with_indicator, ACS, ACS_ORIG, DONES1, OBS0, OBS0_ORIG, OBS1, OBS1_ORIG, REWS},
        RewardRelabeler, Schema, Transition,
    },
    util::array_min2d,
};
use log::trace;
use ndarray::{Array1, ArrayD, Axis};
use std::iter;

/// Turns environment steps into absorbing-state wrapped transitions.
///
/// Rewards are not taken from the environment: they are computed by a
/// [`RewardRelabeler`] on the wrapped observations and action.
#[derive(Debug, Clone)]
pub struct AbsorbingWrapper {
    ob_shape: Vec<usize>,
    ac_shape: Vec<usize>,
}

impl AbsorbingWrapper {
    /// Creates a wrapper for unwrapped observations and actions of the given shapes.
    pub fn new(ob_shape: &[usize], ac_shape: &[usize]) -> Self {
        Self {
            ob_shape: ob_shape.to_vec(),
            ac_shape: ac_shape.to_vec(),
        }
    }

    /// Builds the unwrapped transition of one environment step, for buffers
    /// without absorbing-state wrapping.
    pub fn plain(
        ob: &ArrayD<f32>,
        ac: &ArrayD<f32>,
        new_ob: &ArrayD<f32>,
        rew: f32,
        done: bool,
    ) -> Transition {
        Transition::new()
            .with(OBS0, ob.clone())
            .with(ACS, ac.clone())
            .with(OBS1, new_ob.clone())
            .with_scalar(REWS, rew)
            .with_scalar(DONES1, flag(done))
    }

    /// Layout of the transitions produced by [`AbsorbingWrapper::wrap`].
    pub fn schema(&self) -> Schema {
        Schema::transitions(&self.ob_shape, &self.ac_shape, true)
    }

    /// Wraps one environment step.
    ///
    /// Returns a single transition, unless the episode terminated without hitting
    /// its time limit: then the real transition leads to the absorbing state and
    /// is followed by the absorbing-to-absorbing transition.
    pub fn wrap(
        &self,
        ob: &ArrayD<f32>,
        ac: &ArrayD<f32>,
        new_ob: &ArrayD<f32>,
        done: bool,
        time_limit_reached: bool,
        reward: &dyn RewardRelabeler,
    ) -> Result<Vec<Transition>> {
        check_shape(OBS0_ORIG, &self.ob_shape, ob)?;
        check_shape(ACS_ORIG, &self.ac_shape, ac)?;
        check_shape(OBS1_ORIG, &self.ob_shape, new_ob)?;

        let ob_w = append_indicator(ob, 0.0);
        let ac_w = append_indicator(ac, 0.0);

        if done && !time_limit_reached {
            let absorbing_ob = self.absorbing(&self.ob_shape);
            let absorbing_ac = self.absorbing(&self.ac_shape);

            let rew = reward_of_one(reward, &ob_w, &ac_w, &absorbing_ob)?;
            let terminal = self.transition(
                ob_w,
                ac_w,
                absorbing_ob.clone(),
                rew,
                done,
                ob,
                ac,
                new_ob,
            );

            let rew_a = reward_of_one(reward, &absorbing_ob, &absorbing_ac, &absorbing_ob)?;
            let absorbing = self.transition(
                absorbing_ob.clone(),
                absorbing_ac,
                absorbing_ob,
                rew_a,
                done,
                ob,
                ac,
                new_ob,
            );
            trace!("Wrapped a terminal step with an absorbing transition");

            Ok(vec![terminal, absorbing])
        } else {
            let new_ob_w = append_indicator(new_ob, 0.0);
            let rew = reward_of_one(reward, &ob_w, &ac_w, &new_ob_w)?;
            Ok(vec![self.transition(ob_w, ac_w, new_ob_w, rew, done, ob, ac, new_ob)])
        }
    }

    /// The wrapped absorbing value: zeros followed by the indicator `1`.
    fn absorbing(&self, shape: &[usize]) -> ArrayD<f32> {
        let mut v = vec![0f32; with_indicator(shape)[0]];
        if let Some(last) = v.last_mut() {
            *last = 1.0;
        }
        Array1::from(v).into_dyn()
    }

    #[allow(clippy::too_many_arguments)]
    fn transition(
        &self,
        obs0: ArrayD<f32>,
        acs: ArrayD<f32>,
        obs1: ArrayD<f32>,
        rew: f32,
        done: bool,
        ob: &ArrayD<f32>,
        ac: &ArrayD<f32>,
        new_ob: &ArrayD<f32>,
    ) -> Transition {
        Transition::new()
            .with(OBS0, obs0)
            .with(ACS, acs)
            .with(OBS1, obs1)
            .with_scalar(REWS, rew)
            .with_scalar(DONES1, flag(done))
            .with(OBS0_ORIG, ob.clone())
            .with(ACS_ORIG, ac.clone())
            .with(OBS1_ORIG, new_ob.clone())
    }
}

fn flag(b: bool) -> f32 {
    if b {
        1.0
    } else {
        0.0
    }
}

fn check_shape(field: &str, expected: &[usize], v: &ArrayD<f32>) -> Result<()> {
    if v.shape() == expected {
        Ok(())
    } else {
        Err(ReplayError::ShapeMismatch {
            field: field.to_string(),
            expected: expected.to_vec(),
            actual: v.shape().to_vec(),
        })
    }
}

/// Flattens `v` and appends `indicator`.
fn append_indicator(v: &ArrayD<f32>, indicator: f32) -> ArrayD<f32> {
    let flat = v.iter().copied().chain(iter::once(indicator)).collect::<Vec<_>>();
    Array1::from(flat).into_dyn()
}

/// Evaluates `reward` on a batch made of a single wrapped transition.
fn reward_of_one(
    reward: &dyn RewardRelabeler,
    obs0: &ArrayD<f32>,
    acs: &ArrayD<f32>,
    obs1: &ArrayD<f32>,
) -> Result<f32> {
    let batch_of_one = |v: &ArrayD<f32>| v.clone().insert_axis(Axis(0));
    let rews = array_min2d(reward.relabel(
        &batch_of_one(obs0),
        &batch_of_one(acs),
        &batch_of_one(obs1),
    ));
    match rews.shape() {
        [1, 1] => Ok(rews.iter().copied().sum()),
        shape => Err(ReplayError::ShapeMismatch {
            field: REWS.to_string(),
            expected: vec![1, 1],
            actual: shape.to_vec(),
        }),
    }
}
