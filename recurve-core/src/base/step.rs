//! Environment step.
use super::Env;

/// Additional information to `Obs` and `Act`.
pub trait Info {}

impl Info for () {}

/// Represents an action, observation and reward tuple `(a_t, o_t+1, r_t)`
/// with some additional information.
///
/// An environment emits a [`Step`] object at every interaction step.
pub struct Step<E: Env> {
    /// Action.
    pub act: E::Act,

    /// Observation after taking the action.
    pub obs: E::Obs,

    /// Reward.
    pub reward: f32,

    /// Flag denoting if the episode terminated at this step.
    pub is_done: bool,

    /// Information defined by the user.
    pub info: E::Info,

    /// Initial observation of the next episode. Set by
    /// [`Env::step_with_reset`] when `is_done` is `true`.
    pub init_obs: Option<E::Obs>,
}

impl<E: Env> Step<E> {
    /// Constructs a [`Step`] object.
    pub fn new(
        obs: E::Obs,
        act: E::Act,
        reward: f32,
        is_done: bool,
        info: E::Info,
        init_obs: Option<E::Obs>,
    ) -> Self {
        Step {
            act,
            obs,
            reward,
            is_done,
            info,
            init_obs,
        }
    }
}

/// Processes [`Step`] objects into items for an experience buffer.
///
/// This trait is used in [`Trainer`](crate::Trainer). [`Step`] objects are
/// accumulated into [`Self::Output`] items, which will be pushed into a buffer
/// implementing [`ExperienceBufferBase`](crate::ExperienceBufferBase). The type
/// [`Self::Output`] should be the same as [`ExperienceBufferBase::Item`].
///
/// An item is emitted only when a unit of experience is complete: a processor
/// that produces whole episodes returns `None` for every step until the
/// terminal one.
///
/// [`Self::Output`]: StepProcessor::Output
/// [`ExperienceBufferBase::Item`]: crate::ExperienceBufferBase::Item
pub trait StepProcessor<E: Env> {
    /// Configuration.
    type Config: Clone;

    /// The type of items produced by this processor.
    type Output;

    /// Builds a processor.
    fn build(config: &Self::Config) -> Self;

    /// Resets the processor with the initial observation of a new episode.
    fn reset(&mut self, init_obs: E::Obs);

    /// Processes a [`Step`] object, possibly producing a finished item.
    fn process(&mut self, step: Step<E>) -> Option<Self::Output>;
}
