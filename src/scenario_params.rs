use graded_cpg::params::NetworkParams;

pub fn get_scenario_params() -> NetworkParams {
    let params_yaml_str = r#"
neurons:
- cm: 5.0e-9
  gm: 1.0e-6
  er: -0.06
  am: 1.0
  sm: -50.0
  d_em: 0.02
  ah: 0.5
  sh: 50.0
  d_eh: 0.0
  d_ena: 0.11
  tauh_max: 0.3
  gna: null
  voltage_range: 0.02
- cm: 5.0e-9
  gm: 1.0e-6
  er: -0.06
  am: 1.0
  sm: -50.0
  d_em: 0.02
  ah: 0.5
  sh: 50.0
  d_eh: 0.0
  d_ena: 0.11
  tauh_max: 0.3
  gna: null
  voltage_range: 0.02
synapses:
- pre_index: 0
  post_index: 1
  synapse_params:
    gmax: 5.16652754648405e-7
    e_syn: -0.1
    e_hi: -0.04
    e_lo: -0.06
- pre_index: 1
  post_index: 0
  synapse_params:
    gmax: 5.16652754648405e-7
    e_syn: -0.1
    e_hi: -0.04
    e_lo: -0.06
technical_params:
  num_threads: 1
  pin_threads: false
"#;

    serde_yaml::from_str(params_yaml_str).unwrap()
}

pub const TF: f64 = 6.0;
pub const DT: f64 = 1e-4;
pub const PULSE_START: f64 = 1.0;
pub const PULSE_DURATION: f64 = 10e-3;
pub const PULSE_NID: usize = 0;
