use std::collections::HashMap;

use color_eyre::eyre::{eyre, Result};
use eframe::{run_native, App, CreationContext, NativeOptions};
use egui::Color32;
use egui_graphs::{
    DefaultGraphView, Graph, SettingsInteraction, SettingsNavigation, SettingsStyle,
};
use petgraph::{graph::EdgeIndex, graph::NodeIndex, prelude::StableGraph};

use crate::dfa::Conversion;
use crate::fa::FA;
use crate::replay::{StepNavigator, TransitionTable};

fn show_graph(ui: &mut egui::Ui, graph: &mut Graph) {
    let navigation_settings = &SettingsNavigation::new()
        .with_zoom_and_pan_enabled(true)
        .with_fit_to_screen_enabled(true);
    let interactive_settings = &SettingsInteraction::new()
        .with_dragging_enabled(true)
        .with_node_clicking_enabled(true)
        .with_node_selection_enabled(true)
        .with_node_selection_multi_enabled(true)
        .with_edge_clicking_enabled(true)
        .with_edge_selection_enabled(true)
        .with_edge_selection_multi_enabled(true);
    let style_settings = &SettingsStyle::default().with_labels_always(true);
    ui.add(
        &mut DefaultGraphView::new(graph)
            .with_styles(style_settings)
            .with_interactions(interactive_settings)
            .with_navigations(navigation_settings),
    );
}

struct Visualizer {
    graph: Graph,
}

impl Visualizer {
    fn new(_: &CreationContext<'_>, graph: Graph) -> Self {
        Visualizer { graph }
    }
}

impl App for Visualizer {
    fn update(&mut self, ctx: &egui::Context, _: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            show_graph(ui, &mut self.graph);
        });
    }
}

/// Pages through the steps of a conversion, drawing the partial DFA of the current step along
/// with its transition table.
struct StepViewer {
    navigator: StepNavigator,
    alphabet: Vec<String>,
    graphs: Vec<Graph>, // One per step
}

impl StepViewer {
    fn new(_: &CreationContext<'_>, conversion: Conversion) -> Self {
        let graphs = conversion
            .steps
            .iter()
            .map(|step| generate_graph(&step.result_automaton))
            .collect();

        StepViewer {
            navigator: StepNavigator::new(conversion.steps),
            alphabet: conversion.alphabet,
            graphs,
        }
    }

    fn show_step_list(&mut self, ui: &mut egui::Ui) {
        ui.heading("Conversion Steps");
        let mut selected = None;

        egui::ScrollArea::vertical().show(ui, |ui| {
            for (index, step) in self.navigator.steps().iter().enumerate() {
                let text = format!("Step {}\n{}", step.step, step.description);
                if ui
                    .selectable_label(index == self.navigator.index(), text)
                    .clicked()
                {
                    selected = Some(index);
                }
            }
        });

        if let Some(index) = selected {
            let _ = self.navigator.jump_to(index); // Index comes from the list, always in range
        }
    }

    fn show_table(&self, ui: &mut egui::Ui) {
        let step = match self.navigator.current() {
            Some(step) => step,
            None => return,
        };

        ui.heading(format!("Step {}", step.step));
        ui.label(&step.description);

        let table = TransitionTable::for_step(step, &self.alphabet);

        egui::Grid::new("transition_table")
            .striped(true)
            .show(ui, |ui| {
                ui.strong("State");
                for symbol in &table.symbols {
                    ui.strong(symbol.as_str());
                }
                ui.end_row();

                for row in &table.rows {
                    let initial = if row.is_initial { "→" } else { "" };
                    let accepting = if row.is_accepting { "*" } else { "" };
                    ui.monospace(format!("{}{}{}", initial, accepting, row.label));
                    for cell in &row.cells {
                        ui.monospace(TransitionTable::cell_text(cell));
                    }
                    ui.end_row();
                }
            });
    }
}

impl App for StepViewer {
    fn update(&mut self, ctx: &egui::Context, _: &mut eframe::Frame) {
        egui::SidePanel::left("steps").show(ctx, |ui| {
            self.show_step_list(ui);
        });

        egui::TopBottomPanel::bottom("step_details").show(ctx, |ui| {
            self.show_table(ui);

            ui.horizontal(|ui| {
                if ui
                    .add_enabled(!self.navigator.is_first(), egui::Button::new("Previous"))
                    .clicked()
                {
                    self.navigator.prev_step();
                }
                if ui
                    .add_enabled(!self.navigator.is_last(), egui::Button::new("Next"))
                    .clicked()
                {
                    self.navigator.next_step();
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let index = self.navigator.index();
            if let Some(graph) = self.graphs.get_mut(index) {
                show_graph(ui, graph);
            }
        });
    }
}

fn generate_graph<T: FA>(fa: &T) -> Graph {
    let mut stable_graph = StableGraph::new();

    let num_states = fa.get_num_states();

    let start_node_color = Color32::from_rgb(20, 67, 130);
    let accept_node_color = Color32::from_rgb(20, 130, 90);

    let mut edge_map: HashMap<(NodeIndex, NodeIndex), EdgeIndex> = HashMap::new();
    let mut edge_labels: HashMap<EdgeIndex, String> = HashMap::new();

    // Add all nodes

    for _state_idx in 0..num_states {
        stable_graph.add_node(());
    }

    // Add all edges, merging the symbols of parallel transitions into one label

    for state_idx in 0..num_states {
        for (symbol, target) in fa.get_state_transitions(state_idx) {
            let key = (NodeIndex::new(state_idx), NodeIndex::new(target));

            let edge_idx = *edge_map
                .entry(key)
                .or_insert_with(|| stable_graph.add_edge(key.0, key.1, ()));

            edge_labels
                .entry(edge_idx)
                .and_modify(|label| {
                    label.push_str(", ");
                    label.push_str(symbol);
                })
                .or_insert_with(|| symbol.to_string());
        }
    }

    let mut graph = Graph::from(&stable_graph);

    for (state_idx, state) in fa.get_states().iter().enumerate() {
        if let Some(node) = graph.node_mut(NodeIndex::new(state_idx)) {
            node.set_label(state.label.clone());
        }
    }

    for start_state in fa.get_start_states().iter_ones() {
        if let Some(start_node) = graph.node_mut(NodeIndex::new(start_state)) {
            start_node.set_color(start_node_color);
        }
    }

    for accept_state in fa.get_acceptor_states().iter_ones() {
        if let Some(accept_node) = graph.node_mut(NodeIndex::new(accept_state)) {
            accept_node.set_color(accept_node_color);
        }
    }

    for (edge_idx, label) in edge_labels {
        if let Some(edge) = graph.edge_mut(edge_idx) {
            edge.set_label(label);
        }
    }

    graph
}

/// Visualizes the finite automaton provided
pub fn visualize<T: FA>(fa: &T) -> Result<()> {
    let graph = generate_graph(fa);
    run_native(
        "finite automata visualizer",
        NativeOptions::default(),
        Box::new(|cc| Ok(Box::new(Visualizer::new(cc, graph)))),
    )
    .map_err(|error| eyre!("{}", error))
}

/// Opens a window to step through the conversion
pub fn visualize_steps(conversion: Conversion) -> Result<()> {
    run_native(
        "subset construction steps",
        NativeOptions::default(),
        Box::new(|cc| Ok(Box::new(StepViewer::new(cc, conversion)))),
    )
    .map_err(|error| eyre!("{}", error))
}
