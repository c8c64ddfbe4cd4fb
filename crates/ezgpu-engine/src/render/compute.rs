/// Workgroup count covering `n` invocations with groups of `group_size`.
pub fn workgroups_for(n: u32, group_size: u32) -> u32 {
    n.div_ceil(group_size.max(1))
}

/// Records one compute dispatch; bind group `i` goes to slot `i`.
pub fn dispatch(
    encoder: &mut wgpu::CommandEncoder,
    pipeline: &wgpu::ComputePipeline,
    bind_groups: &[&wgpu::BindGroup],
    workgroups: [u32; 3],
) {
    let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
        label: Some("ezgpu compute"),
        timestamp_writes: None,
    });
    pass.set_pipeline(pipeline);
    for (i, bg) in bind_groups.iter().enumerate() {
        pass.set_bind_group(i as u32, Some(*bg), &[]);
    }
    let [x, y, z] = workgroups;
    pass.dispatch_workgroups(x, y, z);
}
