/// Steepened logistic function used by every neuron.
///
/// # Examples
/// ```
/// use neatris_nn::networks::sigmoid;
///
/// assert_eq!(sigmoid(0.0), 0.5);
/// assert!(sigmoid(-10.0) < 1e-20);
/// ```
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-4.9 * x).exp())
}

/// A network node: accumulates weighted signals,
/// and caches its activation once fired.
#[derive(Clone, Debug, Default, PartialEq)]
pub(super) struct Neuron {
    input_sum: f32,
    output: Option<f32>,
}

impl Neuron {
    /// Adds a signal to the input sum, invalidating
    /// any cached activation.
    pub(super) fn take_input(&mut self, signal: f32) {
        self.input_sum += signal;
        self.output = None;
    }

    /// Returns the activation of the current input sum.
    /// Repeated calls reuse the cached value.
    pub(super) fn fire(&mut self) -> f32 {
        let input_sum = self.input_sum;
        *self.output.get_or_insert_with(|| sigmoid(input_sum))
    }

    pub(super) fn reset(&mut self) {
        self.input_sum = 0.0;
        self.output = None;
    }
}
