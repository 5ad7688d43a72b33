mod confusion_plot;

pub use confusion_plot::{ConfusionPlot, PlotFormat};
