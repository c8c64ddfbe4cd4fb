use std::sync::Arc;

use anyhow::{Context, Result};

use super::GpuInit;

/// Owns the wgpu core objects.
///
/// This is the headless rendering context every resource wrapper is created
/// from. There is no surface: rendering targets are [`crate::resources::Fbo`]s.
pub struct Gpu {
    /// Selected adapter.
    adapter: wgpu::Adapter,

    /// Logical device.
    device: wgpu::Device,

    /// Command queue.
    queue: wgpu::Queue,
}

impl Gpu {
    /// Creates a headless GPU context.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu; use
    /// [`Gpu::new_blocking`] from synchronous code.
    pub async fn new(init: GpuInit) -> Result<Self> {
        let GpuInit {
            backends,
            power_preference,
            force_fallback_adapter,
            required_features,
            required_limits,
        } = init;

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference,
                compatible_surface: None,
                force_fallback_adapter,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let info = adapter.get_info();
        log::info!(
            "using adapter `{}` ({:?}, {:?})",
            info.name,
            info.backend,
            info.device_type
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("ezgpu device"),
                required_features,
                required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        // Errors outside a validation scope are logged instead of panicking.
        device.on_uncaptured_error(Arc::new(|e: wgpu::Error| {
            log::error!("wgpu uncaptured error: {e}");
        }));

        Ok(Self {
            adapter,
            device,
            queue,
        })
    }

    /// Blocking variant of [`Gpu::new`].
    pub fn new_blocking(init: GpuInit) -> Result<Self> {
        pollster::block_on(Self::new(init))
    }

    /// Returns a reference to the logical device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Returns a reference to the command queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Name, backend and device type of the selected adapter.
    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    /// Limits granted to the device.
    pub fn limits(&self) -> wgpu::Limits {
        self.device.limits()
    }

    /// Features granted to the device.
    pub fn features(&self) -> wgpu::Features {
        self.device.features()
    }

    /// Capabilities missing on GL-class adapters (compute, storage, ...).
    pub fn downlevel_flags(&self) -> wgpu::DownlevelFlags {
        self.adapter.get_downlevel_capabilities().flags
    }

    /// Usages the device accepts for textures of `format`.
    ///
    /// Adapter-specific usages only count when the device was created with
    /// `TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES`.
    pub fn format_usages(&self, format: wgpu::TextureFormat) -> wgpu::TextureUsages {
        let features = self.features();
        if features.contains(wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES) {
            self.adapter.get_texture_format_features(format).allowed_usages
        } else {
            format.guaranteed_format_features(features).allowed_usages
        }
    }

    /// Creates a command encoder labelled `label`.
    pub fn create_encoder(&self, label: &str) -> wgpu::CommandEncoder {
        self.device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) })
    }

    /// Submits the recorded commands of a single encoder.
    pub fn submit(&self, encoder: wgpu::CommandEncoder) -> wgpu::SubmissionIndex {
        self.queue.submit(std::iter::once(encoder.finish()))
    }

    /// Runs `f` inside a validation error scope.
    ///
    /// Returns the result of `f` together with the first validation error wgpu
    /// reported while it ran. The value is still returned on error but is
    /// invalid and must not be used.
    pub fn validated<T>(&self, f: impl FnOnce(&wgpu::Device) -> T) -> (T, Option<wgpu::Error>) {
        let scope = self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let out = f(&self.device);
        let error = pollster::block_on(scope.pop());
        (out, error)
    }

    /// Blocks until all submitted work has finished.
    pub fn wait_idle(&self) -> Result<()> {
        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .context("failed to wait for the device")?;
        Ok(())
    }
}
