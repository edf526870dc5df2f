use clap::Parser;
use clio::ClioPath;

/// A program to store the configuration a cluster was bootstrapped with in the cluster itself
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub(crate) struct Cli {
    /// etcd endpoint of the cluster to store the configuration in
    #[clap(long)]
    pub(crate) etcd_endpoint: String,

    /// The prefix under which the apiserver keeps its resources in etcd
    #[clap(long, default_value = "/registry")]
    pub(crate) etcd_prefix: String,

    /// A kubeadm.k8s.io/v1alpha1 MasterConfiguration file, the configuration to store
    #[clap(long, value_parser = clap::value_parser!(ClioPath).exists().is_file())]
    pub(crate) master_configuration: ClioPath,

    /// Name of the master node, overrides the nodeName of the MasterConfiguration file. The node
    /// must already be registered in the cluster.
    #[clap(long)]
    pub(crate) node_name: Option<String>,

    /// Threads to use for the async runtime. Defaults to using as many threads as there are
    /// logical CPUs
    #[clap(long)]
    pub(crate) threads: Option<usize>,

    /// Generate a summary
    #[clap(long, value_parser = clap::value_parser!(ClioPath))]
    pub(crate) summary_file: Option<ClioPath>,

    /// Don't actually write anything to etcd. The records that would have been written are still
    /// included in the summary.
    #[clap(long)]
    pub(crate) dry_run: bool,
}
