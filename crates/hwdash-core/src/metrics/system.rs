// Host metric source: CPU and memory through sysinfo, GPU through
// nvidia-smi, latency through a timed TCP connect.

use std::collections::BTreeSet;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::process::Command;
use std::time::{Duration, Instant};

use sysinfo::System;
use tracing::{debug, warn};

use super::{MetricKind, MetricSource, Sample};
use crate::config::MetricsConfig;

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;
const MB_PER_GB: f64 = 1024.0;

const NVIDIA_SMI_ARGS: [&str; 2] = [
    "--query-gpu=utilization.gpu,temperature.gpu,memory.used,memory.total,fan.speed",
    "--format=csv,noheader,nounits",
];

/// One row of `nvidia-smi` output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpuReading {
    pub utilization: f64,
    pub temperature: f64,
    pub memory_used_gb: f64,
    pub memory_total_gb: f64,
    /// Fanless and passively cooled cards report `[N/A]`.
    pub fan_speed: Option<f64>,
}

/// Parse the first GPU row of
/// `nvidia-smi --query-gpu=... --format=csv,noheader,nounits`.
pub fn parse_nvidia_smi(output: &str) -> Option<GpuReading> {
    let line = output.lines().map(str::trim).find(|l| !l.is_empty())?;
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() < 4 {
        return None;
    }
    let number = |s: &str| s.parse::<f64>().ok();
    Some(GpuReading {
        utilization: number(fields[0])?,
        temperature: number(fields[1])?,
        memory_used_gb: number(fields[2])? / MB_PER_GB,
        memory_total_gb: number(fields[3])? / MB_PER_GB,
        fan_speed: fields.get(4).and_then(|s| number(s)),
    })
}

/// Samples the local machine.
pub struct SystemSource {
    sys: System,
    ping_host: String,
    ping_addr: Option<SocketAddr>,
    ping_timeout: Duration,
    gpu_query: bool,
    gpu_unavailable: bool,
}

impl SystemSource {
    pub fn new(config: &MetricsConfig) -> Self {
        SystemSource {
            sys: System::new(),
            ping_host: config.ping_host.clone(),
            ping_addr: None,
            ping_timeout: Duration::from_millis(config.ping_timeout_ms),
            gpu_query: config.gpu_query,
            gpu_unavailable: false,
        }
    }

    fn query_gpu(&mut self) -> Option<GpuReading> {
        if !self.gpu_query || self.gpu_unavailable {
            return None;
        }
        let output = match Command::new("nvidia-smi").args(NVIDIA_SMI_ARGS).output() {
            Ok(output) if output.status.success() => output,
            Ok(output) => {
                warn!("nvidia-smi exited with {}; GPU metrics disabled", output.status);
                self.gpu_unavailable = true;
                return None;
            }
            Err(e) => {
                warn!("nvidia-smi not available ({e}); GPU metrics disabled");
                self.gpu_unavailable = true;
                return None;
            }
        };
        let text = String::from_utf8_lossy(&output.stdout);
        let reading = parse_nvidia_smi(&text);
        if reading.is_none() {
            debug!("unparseable nvidia-smi output: {text:?}");
        }
        reading
    }

    fn resolve_ping(&mut self) -> Option<SocketAddr> {
        if self.ping_addr.is_none() {
            self.ping_addr = match self.ping_host.to_socket_addrs() {
                Ok(mut addrs) => addrs.next(),
                Err(e) => {
                    debug!("cannot resolve ping host {}: {e}", self.ping_host);
                    None
                }
            };
        }
        self.ping_addr
    }

    fn measure_ping(&mut self) -> Option<f64> {
        let addr = self.resolve_ping()?;
        let started = Instant::now();
        match TcpStream::connect_timeout(&addr, self.ping_timeout) {
            Ok(_) => Some(started.elapsed().as_secs_f64() * 1000.0),
            Err(e) => {
                debug!("ping to {addr} failed: {e}");
                None
            }
        }
    }
}

impl MetricSource for SystemSource {
    fn poll(&mut self, enabled: &BTreeSet<MetricKind>) -> Sample {
        let mut sample = Sample::default();

        if enabled.contains(&MetricKind::Cpu) {
            self.sys.refresh_cpu_usage();
            sample
                .values
                .insert(MetricKind::Cpu, f64::from(self.sys.global_cpu_usage()));
        }

        if enabled.contains(&MetricKind::Memory) {
            self.sys.refresh_memory();
            let total = self.sys.total_memory() as f64 / BYTES_PER_GB;
            sample
                .values
                .insert(MetricKind::Memory, self.sys.used_memory() as f64 / BYTES_PER_GB);
            sample.maxima.insert(MetricKind::Memory, total);
        }

        if enabled.iter().any(|kind| kind.is_gpu()) {
            if let Some(gpu) = self.query_gpu() {
                sample.values.insert(MetricKind::Gpu, gpu.utilization);
                sample.values.insert(MetricKind::GpuTemp, gpu.temperature);
                sample.values.insert(MetricKind::GpuMemory, gpu.memory_used_gb);
                sample.maxima.insert(MetricKind::GpuMemory, gpu.memory_total_gb);
                if let Some(fan) = gpu.fan_speed {
                    sample.values.insert(MetricKind::FanSpeed, fan);
                }
            }
        }

        if enabled.contains(&MetricKind::Ping) {
            if let Some(ms) = self.measure_ping() {
                sample.values.insert(MetricKind::Ping, ms);
            }
        }

        sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_nvidia_smi_row() {
        let reading = parse_nvidia_smi("37, 55, 2048, 8192, 30\n").unwrap();
        assert_eq!(reading.utilization, 37.0);
        assert_eq!(reading.temperature, 55.0);
        assert_eq!(reading.memory_used_gb, 2.0);
        assert_eq!(reading.memory_total_gb, 8.0);
        assert_eq!(reading.fan_speed, Some(30.0));
    }

    #[test]
    fn fan_not_available_is_none() {
        let reading = parse_nvidia_smi("5, 40, 512, 4096, [N/A]").unwrap();
        assert_eq!(reading.fan_speed, None);
    }

    #[test]
    fn uses_first_gpu_only() {
        let reading = parse_nvidia_smi("\n10, 40, 1024, 4096, 20\n90, 80, 4096, 4096, 90\n").unwrap();
        assert_eq!(reading.utilization, 10.0);
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_nvidia_smi(""), None);
        assert_eq!(parse_nvidia_smi("No devices were found"), None);
        assert_eq!(parse_nvidia_smi("a, b, c, d, e"), None);
    }

    #[test]
    fn unenabled_metrics_are_not_sampled() {
        let config = MetricsConfig {
            gpu_query: false,
            ..MetricsConfig::default()
        };
        let mut source = SystemSource::new(&config);
        let sample = source.poll(&BTreeSet::from([MetricKind::Gpu]));
        assert!(sample.values.is_empty());
    }
}
