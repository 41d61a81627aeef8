//! Typed minimisation options and their spelling-tolerant names.
use core::str::FromStr;

use nalgebra::DVector;

use crate::{generic::Algorithm, problem::JacobianFn, MinimizeError};

/// Lower-case a name and fold the separators `_` and `-` into spaces.
pub(crate) fn normalize(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            '_' | '-' => ' ',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

/// Step length selection for line-search minimisers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LineSearchKind {
    /// Armijo backtracking, sufficient decrease only.
    Backtracking,
    /// Quadratic then cubic interpolation, sufficient decrease only.
    NocedalWrightInterpolation,
    /// Bracketing and zoom for the strong Wolfe conditions.
    NocedalWrightWolfe,
    /// The More and Thuente safeguarded interval search.
    MoreThuente,
    /// Take the initial step length unchanged.
    None,
}

impl FromStr for LineSearchKind {
    type Err = MinimizeError;

    /// Accepts `back*`, `nwi`, `nocedal wright int*`, `nww`,
    /// `nocedal wright wolfe*`, `mt`, `more thuente` and `no line search`.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let key = normalize(name);
        if key.starts_with("back") {
            Ok(Self::Backtracking)
        } else if key.starts_with("nwi") || key.starts_with("nocedal wright int") {
            Ok(Self::NocedalWrightInterpolation)
        } else if key.starts_with("nww") || key.starts_with("nocedal wright wolfe") {
            Ok(Self::NocedalWrightWolfe)
        } else if key.starts_with("mt") || key == "more thuente" {
            Ok(Self::MoreThuente)
        } else if key == "no line search" {
            Ok(Self::None)
        } else {
            Err(MinimizeError::UnknownOption(name.into()))
        }
    }
}

/// Strategy turning an indefinite Hessian into a positive definite one.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HessianModKind {
    Unmodified,
    /// Floor the eigenvalues.
    Eigenvalue,
    /// Cholesky with an added multiple of the identity.
    Cholesky,
    /// Gill, Murray and Wright modified Cholesky.
    Gmw,
    /// Schnabel and Eskow revised modified Cholesky.
    Se99,
}

impl FromStr for HessianModKind {
    type Err = MinimizeError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let key = normalize(name);
        if key.starts_with("no hessian mod") {
            Ok(Self::Unmodified)
        } else if key.starts_with("eigen") {
            Ok(Self::Eigenvalue)
        } else if key.starts_with("chol") {
            Ok(Self::Cholesky)
        } else if key == "gmw" {
            Ok(Self::Gmw)
        } else if key.starts_with("se99") {
            Ok(Self::Se99)
        } else {
            Err(MinimizeError::UnknownOption(name.into()))
        }
    }
}

/// Source of curvature for trust-region minimisers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HessianType {
    /// The user-supplied Hessian.
    Newton,
    /// A BFGS approximation built from gradient differences.
    Bfgs,
}

impl FromStr for HessianType {
    type Err = MinimizeError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let key = normalize(name);
        if key.starts_with("bfgs") {
            Ok(Self::Bfgs)
        } else if key.starts_with("newton") {
            Ok(Self::Newton)
        } else {
            Err(MinimizeError::UnknownOption(name.into()))
        }
    }
}

/// Algorithm specific options for [`Minimizer`](crate::Minimizer).
///
/// Fields which an algorithm does not use are rejected when it is set up,
/// so a line search given to a trust-region method is an error rather than
/// silently ignored.
#[derive(Clone, Default)]
pub struct MinOptions<'a> {
    pub line_search: Option<LineSearchKind>,
    pub hessian_type: Option<HessianType>,
    pub hessian_mod: Option<HessianModKind>,
    /// Unconstrained algorithm run inside a constrained wrapper. The other
    /// fields then configure that inner algorithm.
    pub inner_algorithm: Option<Algorithm>,
    /// Model Jacobian for Levenberg-Marquardt.
    pub jacobian: Option<&'a JacobianFn<'a>>,
    /// Measurement errors `$\sigma_i$` for Levenberg-Marquardt.
    pub errors: Option<DVector<f64>>,
}

impl<'a> MinOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify each name as a Hessian type, a line search or a Hessian
    /// modification, in that order.
    ///
    /// ```
    /// # use minimize::{HessianModKind, LineSearchKind, MinOptions};
    /// let options = MinOptions::from_names(&["More Thuente", "GMW"]).unwrap();
    /// assert_eq!(options.line_search, Some(LineSearchKind::MoreThuente));
    /// assert_eq!(options.hessian_mod, Some(HessianModKind::Gmw));
    /// ```
    ///
    /// # Errors
    ///
    /// Unknown names and names given twice for the same slot are errors.
    pub fn from_names(names: &[&str]) -> Result<Self, MinimizeError> {
        let mut options = Self::default();
        for &name in names {
            if let Ok(kind) = name.parse::<HessianType>() {
                if options.hessian_type.replace(kind).is_some() {
                    return Err(MinimizeError::UnknownOption(name.into()));
                }
            } else if let Ok(kind) = name.parse::<LineSearchKind>() {
                if options.line_search.replace(kind).is_some() {
                    return Err(MinimizeError::UnknownOption(name.into()));
                }
            } else if let Ok(kind) = name.parse::<HessianModKind>() {
                if options.hessian_mod.replace(kind).is_some() {
                    return Err(MinimizeError::UnknownOption(name.into()));
                }
            } else {
                return Err(MinimizeError::UnknownOption(name.into()));
            }
        }
        Ok(options)
    }

    /// Options for a constrained wrapper: the first name selects the inner
    /// algorithm and the rest configure it.
    pub fn for_inner(algorithm: &str, names: &[&str]) -> Result<Self, MinimizeError> {
        Ok(Self {
            inner_algorithm: Some(algorithm.parse()?),
            ..Self::from_names(names)?
        })
    }

    pub fn with_line_search(self, kind: LineSearchKind) -> Self {
        Self {
            line_search: Some(kind),
            ..self
        }
    }

    pub fn with_hessian_type(self, kind: HessianType) -> Self {
        Self {
            hessian_type: Some(kind),
            ..self
        }
    }

    pub fn with_hessian_mod(self, kind: HessianModKind) -> Self {
        Self {
            hessian_mod: Some(kind),
            ..self
        }
    }

    pub fn with_inner_algorithm(self, algorithm: Algorithm) -> Self {
        Self {
            inner_algorithm: Some(algorithm),
            ..self
        }
    }

    /// Jacobian and measurement errors for Levenberg-Marquardt.
    pub fn with_least_squares(self, jacobian: &'a JacobianFn<'a>, errors: DVector<f64>) -> Self {
        Self {
            jacobian: Some(jacobian),
            errors: Some(errors),
            ..self
        }
    }

    /// The same options without the inner algorithm.
    pub(crate) fn inner(&self) -> Self {
        Self {
            inner_algorithm: None,
            ..self.clone()
        }
    }
}
