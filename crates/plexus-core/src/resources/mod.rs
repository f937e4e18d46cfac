pub mod k8s;
pub mod quantities;

pub use quantities::ResourceQuantity;

use crate::error::{ResourceError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Canonical CPU resource name
pub const CPU_RESOURCE_NAME: &str = "cpu";

/// Canonical memory resource name
pub const MEMORY_RESOURCE_NAME: &str = "memory";

/// Canonical GPU resource name, as advertised by the NVIDIA device plugin
pub const GPU_RESOURCE_NAME: &str = "nvidia.com/gpu";

/// CPU comparison threshold, in millicores
pub const MIN_MILLI_CPU: f64 = 10.0;

/// GPU comparison threshold, in milli-devices
pub const MIN_MILLI_GPU: f64 = 10.0;

/// Memory comparison threshold, in bytes (10 MiB)
pub const MIN_MEMORY: f64 = 10.0 * 1024.0 * 1024.0;

/// Relative tolerance for extended devices in [`ResourceVector::approx_eq`]
const EXTENDED_TOLERANCE: f64 = 1e-9;

/// A multi-dimensional resource quantity: CPU, memory, GPU, and any named
/// extended devices.
///
/// GPU is tracked twice: as the `milli_gpu` scalar and as an entry under
/// [`GPU_RESOURCE_NAME`] in `extended_devices`. The per-dimension thresholds
/// apply only to comparisons; arithmetic is exact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceVector {
    /// CPU in millicores (1000 = 1 core)
    pub milli_cpu: f64,
    /// Memory in bytes
    pub memory: f64,
    /// GPU in milli-devices
    pub milli_gpu: f64,
    /// Extended devices by resource name (GPU included)
    #[serde(default)]
    pub extended_devices: HashMap<String, f64>,
}

impl ResourceVector {
    /// Zero vector with no extended devices
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a vector from `(name, quantity)` pairs.
    ///
    /// CPU and GPU scalars take the milli value, memory and extended devices
    /// take the whole value. Repeated names accumulate. Unknown names are
    /// kept as extended devices without validation.
    pub fn from_quantities<I, S>(quantities: I) -> Self
    where
        I: IntoIterator<Item = (S, ResourceQuantity)>,
        S: AsRef<str>,
    {
        let mut r = Self::empty();
        for (name, quantity) in quantities {
            let name = name.as_ref();
            match name {
                CPU_RESOURCE_NAME => r.milli_cpu += quantity.milli_value(),
                MEMORY_RESOURCE_NAME => r.memory += quantity.value(),
                GPU_RESOURCE_NAME => {
                    r.milli_gpu += quantity.milli_value();
                    *r.extended_devices.entry(name.to_string()).or_insert(0.0) +=
                        quantity.value();
                }
                _ => {
                    *r.extended_devices.entry(name.to_string()).or_insert(0.0) +=
                        quantity.value();
                }
            }
        }
        r
    }

    /// True if CPU, memory and GPU are all below their thresholds.
    /// Extended devices are not considered.
    pub fn is_empty(&self) -> bool {
        self.milli_cpu < MIN_MILLI_CPU && self.memory < MIN_MEMORY && self.milli_gpu < MIN_MILLI_GPU
    }

    /// True if the named dimension is below its threshold. An extended
    /// device that is not present counts as zero.
    pub fn is_zero(&self, name: &str) -> bool {
        match name {
            CPU_RESOURCE_NAME => self.milli_cpu < MIN_MILLI_CPU,
            MEMORY_RESOURCE_NAME => self.memory < MIN_MEMORY,
            GPU_RESOURCE_NAME => self.milli_gpu < MIN_MILLI_GPU,
            _ => self.extended_devices.get(name).copied().unwrap_or(0.0) == 0.0,
        }
    }

    /// Add `other` into this vector, component-wise
    pub fn add(&mut self, other: &ResourceVector) -> &mut Self {
        self.milli_cpu += other.milli_cpu;
        self.memory += other.memory;
        self.milli_gpu += other.milli_gpu;
        for (name, value) in &other.extended_devices {
            *self.extended_devices.entry(name.clone()).or_insert(0.0) += value;
        }
        self
    }

    /// Subtract `other` from this vector, component-wise.
    ///
    /// Fails without touching `self` unless `other.less_equal(self)`.
    /// Extended devices only in `other` go negative, so callers must not
    /// subtract dimensions this vector has never seen.
    pub fn subtract(&mut self, other: &ResourceVector) -> Result<&mut Self> {
        if !other.less_equal(self) {
            return Err(ResourceError::insufficient_resource(
                self.to_string(),
                other.to_string(),
            ));
        }

        self.milli_cpu -= other.milli_cpu;
        self.memory -= other.memory;
        self.milli_gpu -= other.milli_gpu;
        for (name, value) in &other.extended_devices {
            *self.extended_devices.entry(name.clone()).or_insert(0.0) -= value;
        }
        Ok(self)
    }

    /// Multiply every dimension by `ratio`
    pub fn scale(&mut self, ratio: f64) -> &mut Self {
        self.milli_cpu *= ratio;
        self.memory *= ratio;
        self.milli_gpu *= ratio;
        for value in self.extended_devices.values_mut() {
            *value *= ratio;
        }
        self
    }

    /// Strict partial order: every dimension of `self` must be strictly
    /// less than the same dimension of `other`.
    pub fn less(&self, other: &ResourceVector) -> bool {
        for (name, value) in &self.extended_devices {
            match other.extended_devices.get(name) {
                Some(theirs) if value < theirs => {}
                _ => return false,
            }
        }

        self.milli_cpu < other.milli_cpu
            && self.memory < other.memory
            && self.milli_gpu < other.milli_gpu
    }

    /// Tolerant partial order.
    ///
    /// CPU, memory and GPU pass when strictly less or within their threshold.
    /// Extended devices get no threshold: each must exist in `other` and be
    /// no greater than it.
    pub fn less_equal(&self, other: &ResourceVector) -> bool {
        for (name, value) in &self.extended_devices {
            match other.extended_devices.get(name) {
                Some(theirs) if value <= theirs => {}
                _ => return false,
            }
        }

        within(self.milli_cpu, other.milli_cpu, MIN_MILLI_CPU)
            && within(self.memory, other.memory, MIN_MEMORY)
            && within(self.milli_gpu, other.milli_gpu, MIN_MILLI_GPU)
    }

    /// Equality within each dimension's threshold. Extended devices missing
    /// on one side count as zero.
    pub fn approx_eq(&self, other: &ResourceVector) -> bool {
        let scalars_match = (self.milli_cpu - other.milli_cpu).abs() < MIN_MILLI_CPU
            && (self.memory - other.memory).abs() < MIN_MEMORY
            && (self.milli_gpu - other.milli_gpu).abs() < MIN_MILLI_GPU;
        if !scalars_match {
            return false;
        }

        self.extended_devices
            .keys()
            .chain(other.extended_devices.keys())
            .all(|name| {
                let ours = self.extended_devices.get(name).copied().unwrap_or(0.0);
                let theirs = other.extended_devices.get(name).copied().unwrap_or(0.0);
                (ours - theirs).abs() <= EXTENDED_TOLERANCE * ours.abs().max(theirs.abs()).max(1.0)
            })
    }

    /// Value of a named dimension.
    ///
    /// Unlike [`is_zero`](Self::is_zero), an extended device that is not
    /// present is an error rather than zero.
    pub fn get(&self, name: &str) -> Result<f64> {
        match name {
            CPU_RESOURCE_NAME => Ok(self.milli_cpu),
            MEMORY_RESOURCE_NAME => Ok(self.memory),
            GPU_RESOURCE_NAME => Ok(self.milli_gpu),
            _ => self
                .extended_devices
                .get(name)
                .copied()
                .ok_or_else(|| ResourceError::unknown_dimension(name)),
        }
    }

    /// Names of the extended devices carried by this vector
    pub fn extended_names(&self) -> impl Iterator<Item = &str> {
        self.extended_devices.keys().map(String::as_str)
    }

    /// Canonical dimension names shared by every vector.
    ///
    /// Extended devices are per-vector; see [`extended_names`](Self::extended_names).
    pub fn dimension_names() -> [&'static str; 3] {
        [CPU_RESOURCE_NAME, MEMORY_RESOURCE_NAME, GPU_RESOURCE_NAME]
    }
}

fn within(ours: f64, theirs: f64, epsilon: f64) -> bool {
    ours < theirs || (theirs - ours).abs() < epsilon
}

impl fmt::Display for ResourceVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut extended: Vec<_> = self.extended_devices.iter().collect();
        extended.sort_by(|a, b| a.0.cmp(b.0));
        write!(
            f,
            "cpu {:.2}, memory {:.2}, GPU {:.2}, extended {:?}",
            self.milli_cpu, self.memory, self.milli_gpu, extended
        )
    }
}
