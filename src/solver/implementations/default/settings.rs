use crate::solver::chordal::MergeMethod;
use crate::{
    algebra::*,
    solver::core::{SettingsError, SolverError},
};
use derive_builder::Builder;

#[cfg(feature = "serde")]
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Settings of the [`DefaultSolver`](super::DefaultSolver)

#[derive(Builder, Debug, Clone, PartialEq)]
#[builder(build_fn(validate = "Self::validate"))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(bound = "T: Serialize + DeserializeOwned"))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DefaultSettings<T: FloatT> {
    ///maximum number of iterations
    #[builder(default = "2500")]
    pub max_iter: u32,

    ///maximum run time (seconds)
    #[builder(default = "f64::INFINITY")]
    pub time_limit: f64,

    ///log iteration progress at info level
    #[builder(default = "false")]
    pub verbose: bool,

    ///record the fine grained timings in the result
    #[builder(default = "false")]
    pub verbose_timing: bool,

    ///absolute residual tolerance
    #[builder(default = "(1e-5).as_T()")]
    pub eps_abs: T,

    ///relative residual tolerance
    #[builder(default = "(1e-5).as_T()")]
    pub eps_rel: T,

    ///primal infeasibility tolerance
    #[builder(default = "(1e-4).as_T()")]
    pub eps_prim_inf: T,

    ///dual infeasibility tolerance
    #[builder(default = "(1e-4).as_T()")]
    pub eps_dual_inf: T,

    ///iterations between convergence checks
    #[builder(default = "25")]
    pub check_termination: u32,

    ///iterations between infeasibility checks
    #[builder(default = "40")]
    pub check_infeasibility: u32,

    ///initial ADMM penalty ρ
    #[builder(default = "(0.1).as_T()")]
    pub rho: T,

    ///proximal regularization σ of the x update
    #[builder(default = "(1e-6).as_T()")]
    pub sigma: T,

    ///over-relaxation parameter, in (0,2)
    #[builder(default = "(1.6).as_T()")]
    pub alpha: T,

    ///adapt ρ to balance primal and dual residuals
    #[builder(default = "true")]
    pub adaptive_rho: bool,

    ///iterations between adaptive ρ checks
    #[builder(default = "40")]
    pub adaptive_rho_interval: u32,

    ///ρ is only changed when the proposed value differs by this factor
    #[builder(default = "(5.).as_T()")]
    pub adaptive_rho_tolerance: T,

    ///enable data equilibration pre-scaling
    #[builder(default = "true")]
    pub equilibrate_enable: bool,

    /// maximum equilibration scaling iterations
    #[builder(default = "10")]
    pub equilibrate_max_iter: u32,

    ///minimum equilibration scaling allowed
    #[builder(default = "(1e-4).as_T()")]
    pub equilibrate_min_scaling: T,

    ///maximum equilibration scaling allowed
    #[builder(default = "(1e+4).as_T()")]
    pub equilibrate_max_scaling: T,

    /// enable chordal decomposition of PSD constraints
    #[builder(default = "true")]
    pub chordal_decomposition_enable: bool,

    /// PSD cones are only decomposed if their side dimension exceeds this
    #[builder(default = "4")]
    pub chordal_decomposition_threshold: usize,

    ///chordal decomposition merge method ("none", "parent_child" or "clique_graph").
    #[builder(default = r#""clique_graph".to_string()"#)]
    pub chordal_decomposition_merge_method: String,

    /// complete the dual of decomposed PSD cones to a PSD matrix
    #[builder(default = "true")]
    pub chordal_decomposition_complete_dual: bool,
}

impl<T> Default for DefaultSettings<T>
where
    T: FloatT,
{
    fn default() -> DefaultSettings<T> {
        // every builder default passes validation
        DefaultSettingsBuilder::<T>::default().build().unwrap()
    }
}

macro_rules! check_immutable_setting {
    ($self:expr, $prev:expr, $field:ident) => {
        if $self.$field != $prev.$field {
            return Err(SettingsError::ImmutableSetting(stringify!($field)));
        }
    };
}

impl<T> DefaultSettings<T>
where
    T: FloatT,
{
    /// Checks that all fields hold legal values
    pub fn validate(&self) -> Result<(), SettingsError> {
        validate_chordal_decomposition_merge_method(&self.chordal_decomposition_merge_method)?;
        validate_alpha(self.alpha)?;
        validate_rho(self.rho)?;

        if self.sigma < T::zero() {
            return Err(SettingsError::BadFieldValue("sigma"));
        }
        if self.eps_abs < T::zero() || self.eps_rel < T::zero() {
            return Err(SettingsError::BadFieldValue("eps_abs"));
        }
        if self.eps_prim_inf <= T::zero() {
            return Err(SettingsError::BadFieldValue("eps_prim_inf"));
        }
        if self.eps_dual_inf <= T::zero() {
            return Err(SettingsError::BadFieldValue("eps_dual_inf"));
        }
        if self.check_termination == 0 {
            return Err(SettingsError::BadFieldValue("check_termination"));
        }
        if self.check_infeasibility == 0 {
            return Err(SettingsError::BadFieldValue("check_infeasibility"));
        }
        if self.adaptive_rho_interval == 0 {
            return Err(SettingsError::BadFieldValue("adaptive_rho_interval"));
        }
        if self.adaptive_rho_tolerance < T::one() {
            return Err(SettingsError::BadFieldValue("adaptive_rho_tolerance"));
        }
        if self.equilibrate_min_scaling <= T::zero()
            || self.equilibrate_min_scaling > self.equilibrate_max_scaling
        {
            return Err(SettingsError::BadFieldValue("equilibrate_min_scaling"));
        }
        Ok(())
    }

    /// Checks that `self` may replace `prev` in a solver that has
    /// already been set up.  Settings baked into the scaled and
    /// factored problem cannot change.
    pub fn validate_as_update(&self, prev: &Self) -> Result<(), SettingsError> {
        self.validate()?;

        check_immutable_setting!(self, prev, equilibrate_enable);
        check_immutable_setting!(self, prev, equilibrate_max_iter);
        check_immutable_setting!(self, prev, equilibrate_min_scaling);
        check_immutable_setting!(self, prev, equilibrate_max_scaling);
        check_immutable_setting!(self, prev, chordal_decomposition_enable);
        check_immutable_setting!(self, prev, chordal_decomposition_threshold);
        check_immutable_setting!(self, prev, chordal_decomposition_merge_method);
        check_immutable_setting!(self, prev, sigma);
        check_immutable_setting!(self, prev, rho);

        Ok(())
    }

    /// the merge method as a parsed value.  An unknown name is a
    /// [`SolverError::Decomposition`]; the builder and
    /// [`validate`](DefaultSettings::validate) reject it earlier as a
    /// bad field value.
    pub fn merge_method(&self) -> Result<MergeMethod, SolverError> {
        self.chordal_decomposition_merge_method.parse()
    }
}

// pre build checker (for auto-validation when using the builder)

impl From<SettingsError> for DefaultSettingsBuilderError {
    fn from(e: SettingsError) -> Self {
        DefaultSettingsBuilderError::ValidationError(e.to_string())
    }
}

/// Automatic pre-build settings validation
impl<T> DefaultSettingsBuilder<T>
where
    T: FloatT,
{
    /// check the fields that have been set explicitly
    pub fn validate(&self) -> Result<(), SettingsError> {
        if let Some(ref merge_method) = self.chordal_decomposition_merge_method {
            validate_chordal_decomposition_merge_method(merge_method)?;
        }
        if let Some(alpha) = self.alpha {
            validate_alpha(alpha)?;
        }
        if let Some(rho) = self.rho {
            validate_rho(rho)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------
// individual validation functions go here
// ---------------------------------------------------------

fn validate_chordal_decomposition_merge_method(method: &str) -> Result<(), SettingsError> {
    method
        .parse::<MergeMethod>()
        .map(|_| ())
        .map_err(|_| SettingsError::BadFieldValue("chordal_decomposition_merge_method"))
}

fn validate_alpha<T: FloatT>(alpha: T) -> Result<(), SettingsError> {
    if alpha > T::zero() && alpha < (2.).as_T() {
        Ok(())
    } else {
        Err(SettingsError::BadFieldValue("alpha"))
    }
}

fn validate_rho<T: FloatT>(rho: T) -> Result<(), SettingsError> {
    if rho > T::zero() && rho.is_finite() {
        Ok(())
    } else {
        Err(SettingsError::BadFieldValue("rho"))
    }
}

#[test]
fn test_settings_validate() {
    // all standard settings
    let settings = DefaultSettingsBuilder::<f64>::default().build().unwrap();
    assert_eq!(settings.max_iter, 2500);
    assert_eq!(settings.chordal_decomposition_threshold, 4);
    assert_eq!(settings.merge_method().unwrap(), MergeMethod::CliqueGraph);

    // fail on unknown chordal decomposition merge method
    assert!(DefaultSettingsBuilder::<f64>::default()
        .chordal_decomposition_merge_method("foo".to_string())
        .build()
        .is_err());
    let settings = DefaultSettings::<f64> {
        chordal_decomposition_merge_method: "foo".to_string(),
        ..DefaultSettings::default()
    };
    assert_eq!(
        settings.validate(),
        Err(SettingsError::BadFieldValue("chordal_decomposition_merge_method"))
    );
    assert!(matches!(
        settings.merge_method(),
        Err(SolverError::Decomposition(_))
    ));

    // relaxation outside (0,2)
    assert!(DefaultSettingsBuilder::<f64>::default()
        .alpha(2.0)
        .build()
        .is_err());
    assert!(DefaultSettingsBuilder::<f64>::default()
        .alpha(1.0)
        .build()
        .is_ok());

    // directly construct a bad DefaultSettings and manually check
    let settings = DefaultSettings::<f64> {
        sigma: -1.0,
        ..DefaultSettings::default()
    };
    assert_eq!(
        settings.validate(),
        Err(SettingsError::BadFieldValue("sigma"))
    );

    // try to overlay prohibited update values
    let oldsettings = DefaultSettings::<f64>::default();
    let newsettings = DefaultSettings::<f64> {
        equilibrate_enable: false,
        ..DefaultSettings::default()
    };
    assert_eq!(
        newsettings.validate_as_update(&oldsettings),
        Err(SettingsError::ImmutableSetting("equilibrate_enable"))
    );

    // try to overlay allowed update values
    let oldsettings = DefaultSettings::<f64> {
        max_iter: 10,
        ..DefaultSettings::default()
    };
    let newsettings = DefaultSettings::<f64> {
        max_iter: 11,
        verbose: true,
        ..DefaultSettings::default()
    };
    assert!(newsettings.validate_as_update(&oldsettings).is_ok());
}
