pub fn synthetic_ir(length: usize, sample_rate: f32) -> Vec<f32> {
    (0..length)
        .map(|i| {
            let t = i as f32 / sample_rate;
            let decay = (-t * 3.0).exp();
            let freq = 440.0 * 2.0 * std::f32::consts::PI;
            (freq * t).sin() * decay
        })
        .collect()
}
