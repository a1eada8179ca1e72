use std::sync::Arc;

use crossbeam::channel::{self, Receiver, TryRecvError};

use super::bounds::SliderBounds;
use super::{RangeParameters, Scheduling};
use crate::plotting::projector::{ProjectedDataset, ScreenProjector, Viewport};
use crate::spatial_database::point_set::PointSet;
use crate::spatial_database::region::Region;
use crate::spatial_database::{CoordinateResolver, DataQuery};
use crate::variography::dataset::VariogramDataset;
use crate::variography::model_variograms::VariogramModelKind;

pub type SharedQuery = Arc<dyn DataQuery + Send + Sync>;
pub type SharedResolver = Arc<dyn CoordinateResolver + Send + Sync>;

/// Snapshot of everything a rebuild depends on.
#[derive(Debug, Clone)]
pub struct ComputeRequest {
    pub generation: u64,
    pub params: RangeParameters,
    pub regions: Vec<Region>,
    pub field_ids: Vec<String>,
}

impl ComputeRequest {
    pub fn run<Q, C>(&self, query: &Q, resolver: &C) -> VariogramDataset
    where
        Q: DataQuery + ?Sized,
        C: CoordinateResolver + ?Sized,
    {
        VariogramDataset::build(
            &self.regions,
            &self.field_ids,
            &self.params,
            query,
            resolver,
        )
    }
}

/// A finished rebuild, tagged with the generation it was requested at.
#[derive(Debug, Clone)]
pub struct ComputedDataset {
    pub generation: u64,
    pub params: RangeParameters,
    pub dataset: VariogramDataset,
}

/// Handle to a rebuild that may still be running.
pub struct PendingDataset {
    generation: u64,
    params: RangeParameters,
    receiver: Receiver<VariogramDataset>,
}

impl PendingDataset {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// `None` while the computation is still running.
    pub fn try_take(&self) -> Option<ComputedDataset> {
        match self.receiver.try_recv() {
            Ok(dataset) => Some(self.finish(dataset)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(self.aborted()),
        }
    }

    pub fn wait(self) -> ComputedDataset {
        match self.receiver.recv() {
            Ok(dataset) => self.finish(dataset),
            Err(_) => self.aborted(),
        }
    }

    fn finish(&self, dataset: VariogramDataset) -> ComputedDataset {
        ComputedDataset {
            generation: self.generation,
            params: self.params,
            dataset,
        }
    }

    fn aborted(&self) -> ComputedDataset {
        tracing::error!(generation = self.generation, "variogram worker exited without a result");
        self.finish(VariogramDataset::with_error(
            "",
            "variogram computation aborted",
        ))
    }
}

struct CachedProjection {
    viewport: Viewport,
    dataset_generation: Option<u64>,
    result: Result<ProjectedDataset, String>,
}

/// Owns the interactive parameters and the latest dataset snapshot.
///
/// Every change that affects the binned values bumps the generation; only a
/// result computed for the current generation is ever applied.
pub struct RangeController {
    params: RangeParameters,
    bounds: Option<SliderBounds>,
    has_parameters: bool,
    regions: Vec<Region>,
    field_ids: Vec<String>,
    scheduling: Scheduling,
    generation: u64,
    applied_generation: Option<u64>,
    applied_params: RangeParameters,
    dataset: Arc<VariogramDataset>,
    projection: Option<CachedProjection>,
}

impl RangeController {
    pub fn new(scheduling: Scheduling) -> Self {
        Self {
            params: RangeParameters::default(),
            bounds: None,
            has_parameters: false,
            regions: Vec::new(),
            field_ids: Vec::new(),
            scheduling,
            generation: 0,
            applied_generation: None,
            applied_params: RangeParameters::default(),
            dataset: Arc::new(VariogramDataset::default()),
            projection: None,
        }
    }

    /// Starts from persisted parameters, which bound updates never overwrite.
    pub fn with_parameters(params: RangeParameters, scheduling: Scheduling) -> Self {
        Self {
            params,
            has_parameters: true,
            ..Self::new(scheduling)
        }
    }

    pub fn parameters(&self) -> &RangeParameters {
        &self.params
    }

    pub fn bounds(&self) -> Option<&SliderBounds> {
        self.bounds.as_ref()
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn field_ids(&self) -> &[String] {
        &self.field_ids
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True until a result for the current generation has been applied.
    pub fn needs_rebuild(&self) -> bool {
        self.applied_generation != Some(self.generation)
    }

    pub fn dataset(&self) -> Arc<VariogramDataset> {
        Arc::clone(&self.dataset)
    }

    /// Recomputes slider bounds for a newly loaded dataset and invalidates
    /// the dataset binned against the previous coordinates.
    ///
    /// Without persisted parameters the first call also picks the midpoints
    /// of the bounds as max distance and bin count.
    pub fn update_bounds(&mut self, points: &PointSet) -> SliderBounds {
        let bounds = SliderBounds::from_point_set(points);
        self.bounds = Some(bounds);

        if !self.has_parameters {
            self.has_parameters = true;
            self.params = RangeParameters {
                max_distance: bounds.default_max_distance(),
                bin_count: bounds.default_bin_count(),
                ..self.params
            };
        }
        self.invalidate("points");
        bounds
    }

    pub fn set_parameters(&mut self, params: RangeParameters) {
        let rebuild = self.params.requires_rebuild(&params);
        self.params = params;
        self.has_parameters = true;
        if rebuild {
            self.invalidate("parameters");
        }
    }

    pub fn set_max_distance(&mut self, max_distance: f64) {
        self.set_parameters(RangeParameters {
            max_distance,
            ..self.params
        });
    }

    pub fn set_bin_count(&mut self, bin_count: u32) {
        self.set_parameters(RangeParameters {
            bin_count,
            ..self.params
        });
    }

    pub fn set_combine_xor(&mut self, left: bool, right: bool) {
        self.set_parameters(RangeParameters {
            combine_left_xor: left,
            combine_right_xor: right,
            ..self.params
        });
    }

    /// Display only, the dataset stays valid.
    pub fn set_vario_model(&mut self, vario_model: VariogramModelKind) {
        self.params.vario_model = vario_model;
    }

    pub fn set_regions(&mut self, regions: Vec<Region>) {
        if regions != self.regions {
            self.regions = regions;
            self.invalidate("regions");
        }
    }

    pub fn set_field_ids(&mut self, field_ids: Vec<String>) {
        if field_ids != self.field_ids {
            self.field_ids = field_ids;
            self.invalidate("fields");
        }
    }

    /// Forces a rebuild, e.g. after the selection the fetched series depend on changed.
    pub fn invalidate(&mut self, reason: &str) {
        self.generation += 1;
        tracing::debug!(generation = self.generation, reason, "variogram invalidated");
    }

    pub fn request(&self) -> ComputeRequest {
        ComputeRequest {
            generation: self.generation,
            params: self.params,
            regions: self.regions.clone(),
            field_ids: self.field_ids.clone(),
        }
    }

    /// Starts a rebuild for the current generation.
    pub fn compute_async(&self, query: SharedQuery, resolver: SharedResolver) -> PendingDataset {
        let request = self.request();
        let (sender, receiver) = channel::bounded(1);
        let pending = PendingDataset {
            generation: request.generation,
            params: request.params,
            receiver,
        };

        match self.scheduling {
            Scheduling::Inline => {
                let _ = sender.send(request.run(query.as_ref(), resolver.as_ref()));
            }
            Scheduling::Background => rayon::spawn(move || {
                let dataset = request.run(query.as_ref(), resolver.as_ref());
                // the receiver is gone when the caller dropped a stale request
                let _ = sender.send(dataset);
            }),
        }

        pending
    }

    /// Replaces the dataset with `computed` unless a newer request superseded it.
    pub fn apply(&mut self, computed: ComputedDataset) -> bool {
        if computed.generation != self.generation {
            tracing::warn!(
                result = computed.generation,
                current = self.generation,
                "discarding stale variogram result"
            );
            return false;
        }

        self.dataset = Arc::new(computed.dataset);
        self.applied_generation = Some(computed.generation);
        self.applied_params = computed.params;
        self.projection = None;
        true
    }

    /// Applies `pending` if it has finished. Returns whether the dataset changed.
    pub fn poll(&mut self, pending: &PendingDataset) -> bool {
        match pending.try_take() {
            Some(computed) => self.apply(computed),
            None => false,
        }
    }

    /// Computes and applies the current generation before returning.
    pub fn rebuild(&mut self, query: SharedQuery, resolver: SharedResolver) -> bool {
        let computed = self.compute_async(query, resolver).wait();
        self.apply(computed)
    }

    /// Screen projection of the applied dataset, recomputed when the viewport
    /// or the dataset changed since the last call.
    pub fn projection(
        &mut self,
        projector: &ScreenProjector,
        viewport: Viewport,
    ) -> &Result<ProjectedDataset, String> {
        let fresh = self.projection.as_ref().is_some_and(|cached| {
            cached.viewport == viewport && cached.dataset_generation == self.applied_generation
        });

        if !fresh {
            self.projection = None;
        }

        let dataset = &self.dataset;
        let max_distance = self.applied_params.max_distance;
        let dataset_generation = self.applied_generation;
        let cached = self.projection.get_or_insert_with(|| {
            let result = projector
                .project(dataset, viewport, max_distance)
                .map_err(|err| {
                    tracing::warn!(%err, "variogram projection failed");
                    err.to_string()
                });
            CachedProjection {
                viewport,
                dataset_generation,
                result,
            }
        });
        &cached.result
    }
}
