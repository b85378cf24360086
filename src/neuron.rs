use crate::params::NeuronParams;

pub fn steady_state_gate(u: f64, a: f64, s: f64, de: f64) -> f64 {
    1.0 / (1.0 + a * (-s * (de - u)).exp())
}

pub fn deactivation_time_constant(
    u: f64,
    tauh_max: f64,
    hinf: f64,
    a: f64,
    s: f64,
    de: f64,
) -> f64 {
    tauh_max * hinf * (a * (-s * (de - u)).exp()).max(0.0).sqrt()
}

/// Potentials relative to rest. Balances the leak at `U = r`.
#[allow(clippy::too_many_arguments)]
pub fn derive_sodium_conductance(
    r: f64,
    gm: f64,
    am: f64,
    sm: f64,
    d_em: f64,
    ah: f64,
    sh: f64,
    d_eh: f64,
    d_ena: f64,
) -> f64 {
    let minf = steady_state_gate(r, am, sm, d_em);
    let hinf = steady_state_gate(r, ah, sh, d_eh);

    gm * r / (minf * hinf * (d_ena - r))
}

impl NeuronParams {
    pub fn sodium_conductance(&self) -> f64 {
        self.gna.unwrap_or_else(|| {
            derive_sodium_conductance(
                self.voltage_range,
                self.gm,
                self.am,
                self.sm,
                self.d_em,
                self.ah,
                self.sh,
                self.d_eh,
                self.d_ena,
            )
        })
    }

    pub fn e_m(&self) -> f64 {
        self.er + self.d_em
    }

    pub fn e_h(&self) -> f64 {
        self.er + self.d_eh
    }

    pub fn e_na(&self) -> f64 {
        self.er + self.d_ena
    }

    pub fn resting_gate(&self) -> f64 {
        steady_state_gate(self.er, self.ah, self.sh, self.e_h())
    }
}
