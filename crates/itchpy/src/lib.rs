//! `ITCHPy`: Python access to the ITCHy position query
//!
//! ```python
//! import ITCHPy
//!
//! mouse = ITCHPy.TactileMouseQuery()
//! if mouse.initialize():
//!     mouse.update()
//!     print(mouse.velocity(), mouse.buttonPressed())
//!     mouse.feedback(0, 0, 255)
//! ```

use itchy::{PositionQuery, QueryOptions, Vec2};
use pyo3::prelude::*;
use pyo3::types::PyFloat;
use tracing_subscriber::EnvFilter;

/// Planar vector in metres (or metres per second).
#[pyclass(name = "QVector2D", module = "ITCHPy", subclass)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PyVector2D {
    inner: Vec2,
}

#[pymethods]
impl PyVector2D {
    #[new]
    #[pyo3(signature = (x = 0.0, y = 0.0))]
    fn new(x: f32, y: f32) -> Self {
        Self {
            inner: Vec2::new(x, y),
        }
    }

    #[getter]
    fn x(&self) -> f32 {
        self.inner.x
    }

    #[getter]
    fn y(&self) -> f32 {
        self.inner.y
    }

    #[setter]
    fn set_x(&mut self, x: f32) {
        self.inner.x = x;
    }

    #[setter]
    fn set_y(&mut self, y: f32) {
        self.inner.y = y;
    }

    fn length(&self) -> f32 {
        self.inner.length()
    }

    #[pyo3(name = "lengthSquared")]
    fn length_squared(&self) -> f32 {
        self.inner.length_squared()
    }

    /// `<QVector2D(1.0,2.0)>`, named after the runtime class.
    fn __repr__(slf: &Bound<'_, Self>) -> PyResult<String> {
        let py = slf.py();
        let Vec2 { x, y } = slf.borrow().inner;
        Ok(format!(
            "<{}({},{})>",
            slf.get_type().name()?,
            PyFloat::new(py, f64::from(x)).repr()?,
            PyFloat::new(py, f64::from(y)).repr()?,
        ))
    }

    fn __eq__(&self, other: &Self) -> bool {
        self == other
    }
}

impl From<Vec2> for PyVector2D {
    fn from(inner: Vec2) -> Self {
        Self { inner }
    }
}

/// Query object for the tactile mouse.
///
/// `detached=True` polls the device on a background thread so `update`
/// never blocks; otherwise `update` waits up to `timeout` milliseconds for a
/// fresh report.
#[pyclass(name = "TactileMouseQuery", module = "ITCHPy")]
pub struct PyTactileMouseQuery {
    inner: itchy::TactileMouseQuery,
}

#[pymethods]
impl PyTactileMouseQuery {
    #[new]
    #[pyo3(signature = (detached = false, timeout = 50))]
    fn new(detached: bool, timeout: u32) -> Self {
        let options = QueryOptions {
            detached,
            timeout_ms: timeout,
            ..QueryOptions::default()
        };
        Self::from_query(itchy::TactileMouseQuery::with_hidapi(options))
    }

    fn position(&self) -> PyVector2D {
        self.inner.position().into()
    }

    fn velocity(&self) -> PyVector2D {
        self.inner.velocity().into()
    }

    /// Orientation in radians.
    fn orientation(&self) -> f32 {
        self.inner.orientation()
    }

    #[pyo3(name = "angularVelocity")]
    fn angular_velocity(&self) -> f32 {
        self.inner.angular_velocity()
    }

    #[pyo3(name = "buttonPressed")]
    fn button_pressed(&self) -> bool {
        self.inner.button_pressed()
    }

    fn update(&mut self, py: Python<'_>) {
        py.detach(|| self.inner.update());
    }

    fn initialize(&mut self, py: Python<'_>) -> bool {
        py.detach(|| self.inner.initialize())
    }

    fn feedback(&mut self, r: u8, g: u8, b: u8) {
        self.inner.feedback(r, g, b);
    }
}

impl PyTactileMouseQuery {
    /// Wrap a query built over any device connector.
    pub fn from_query(inner: itchy::TactileMouseQuery) -> Self {
        Self { inner }
    }
}

/// Route library logs to stderr, honoring `RUST_LOG`.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("itchy=warn"));
    // The host process may already own a subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Add the `ITCHPy` classes to `m`.
pub fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyTactileMouseQuery>()?;
    m.add_class::<PyVector2D>()?;
    Ok(())
}

#[pymodule]
#[pyo3(name = "ITCHPy")]
fn itchpy(m: &Bound<'_, PyModule>) -> PyResult<()> {
    init_logging();
    register(m)
}
