use super::{palette::random_colors, Chart, Color, Insets, Legend, Line, Screen, Window};
use crate::{
    store::{
        columns::{APPLIANCES, DEMAND, OVERALL_DEMAND, PRICE, SUPPLY},
        RecordStream,
    },
    Aggregated, Error, Mode, PolicyId, Record, RunContext, SeriesAggregator, SeriesSet, Store,
};
use rand::Rng;

const AVERAGE_CROSSING: f64 = 0.95;
const AVERAGE_ZOOM: f64 = 2.0;

const INDIVIDUAL_CROSSING: f64 = 0.97;
const INDIVIDUAL_ZOOM: f64 = 1.65;

const SUPPLY_DEMAND_ZOOM: f64 = 1.65;

fn aggregate_household(rows: RecordStream<'_>) -> crate::Result<Aggregated<()>> {
    SeriesAggregator::unkeyed()
        .column(DEMAND)
        .column(APPLIANCES)
        .run(rows)
}

fn aggregate_price(rows: RecordStream<'_>) -> crate::Result<Aggregated<()>> {
    SeriesAggregator::unkeyed().column(PRICE).run(rows)
}

/// Takes the single series of an unkeyed field as one line.
fn single_line(
    aggregated: &mut Aggregated<()>,
    field: &str,
    label: &str,
    color: Color,
) -> Vec<Line> {
    aggregated
        .take_series(field)
        .into_iter()
        .flatten()
        .map(|mut series| {
            series.set_label(label);
            Line::from_series(series, color)
        })
        .collect()
}

/// Price chart shared by the policy chart families, placed in the bottom row.
fn price_chart(
    ctx: &RunContext,
    prices: &Aggregated<()>,
    name: &str,
    window: Window,
    color: Color,
    crossing_factor: f64,
    zoom: f64,
) -> Chart {
    let mut prices = prices.clone();
    let crossing = prices.anchor(PRICE).map(|a| a.scaled(crossing_factor));

    Chart::new(
        name,
        format!("Price for run: {}", ctx.run_label()),
        "Price",
        window,
    )
    .lines(single_line(&mut prices, PRICE, "Price", color))
    .crossing(crossing)
    .zoom(zoom)
}

/// Average demand and active appliances of every policy of a run, one line
/// per policy, plus the run's price on the left and right of the bottom row.
///
/// # Errors
///
/// Returns error if a query or the aggregation failed.
pub fn average_policies<R: Rng + ?Sized>(
    store: &Store,
    ctx: &RunContext,
    screen: Screen,
    rng: &mut R,
) -> crate::Result<Vec<Chart>> {
    let run = ctx.run_id();

    let mut aggregated = store.scan_policy_averages(run, |rows| {
        SeriesAggregator::new(Record::require_key)
            .column(DEMAND)
            .column(APPLIANCES)
            .run(rows)
    })?;

    let prices = store.scan_prices(run, aggregate_price)?;

    let demand_crossing = aggregated
        .anchor(DEMAND)
        .map(|a| a.scaled(AVERAGE_CROSSING));
    let appliances_crossing = aggregated
        .anchor(APPLIANCES)
        .map(|a| a.scaled(AVERAGE_CROSSING));

    let demand = aggregated.take_series(DEMAND).unwrap_or_default();
    let appliances = aggregated.take_series(APPLIANCES).unwrap_or_default();

    // one color and one label per policy, shared by both charts
    let mut policies: Vec<PolicyId> = Vec::new();
    for policy in demand.keys().chain(appliances.keys()) {
        if !policies.contains(policy) {
            policies.push(*policy);
        }
    }

    log::debug!("Charting {} policies of run {run}", policies.len());

    let colors = random_colors(policies.len().max(1), rng);

    let mut names: crate::HashMap<PolicyId, (String, Color)> = crate::HashMap::default();
    for (policy, color) in policies.iter().zip(colors.iter()) {
        names.insert(*policy, (store.policy_info(*policy)?, *color));
    }

    let to_lines = |set: SeriesSet<PolicyId>| -> Vec<Line> {
        set.into_iter()
            .filter_map(|mut series| {
                let (label, color) = names.get(series.key())?.clone();
                series.set_label(label);
                Some(Line::from_series(series, color))
            })
            .collect()
    };

    let price_color = colors.first().copied().unwrap_or(Color::BLUE);
    let label = ctx.run_label();

    Ok(vec![
        Chart::new(
            "average-demand",
            format!("Average Demand across Policies\nfor run: {label}"),
            "Average Demand",
            Window::tile(screen, 2, 2, 0, 0),
        )
        .lines(to_lines(demand))
        .legend(Legend::south())
        .insets(Insets {
            top: 10,
            left: 10,
            bottom: 70,
            right: 10,
        })
        .crossing(demand_crossing)
        .zoom(AVERAGE_ZOOM),
        Chart::new(
            "average-appliances",
            format!("Average Active Appliances across Policies\nfor run: {label}"),
            "Average Active Appliances",
            Window::tile(screen, 2, 2, 1, 0),
        )
        .lines(to_lines(appliances))
        .legend(Legend::south())
        .insets(Insets {
            top: 10,
            left: 10,
            bottom: 70,
            right: 10,
        })
        .crossing(appliances_crossing)
        .zoom(AVERAGE_ZOOM),
        price_chart(
            ctx,
            &prices,
            "average-price-left",
            Window::tile(screen, 2, 2, 0, 1),
            price_color,
            AVERAGE_CROSSING,
            AVERAGE_ZOOM,
        ),
        price_chart(
            ctx,
            &prices,
            "average-price-right",
            Window::tile(screen, 2, 2, 1, 1),
            price_color,
            AVERAGE_CROSSING,
            AVERAGE_ZOOM,
        ),
    ])
}

/// Demand and active appliances of one policy: either the average of its
/// households or one household picked at random, plus the run's price.
///
/// # Errors
///
/// Returns [`Error::PolicyRequired`] if `ctx` names no policy, or the error
/// of a failed query or aggregation.
pub fn individual_policy<R: Rng + ?Sized>(
    store: &Store,
    ctx: &RunContext,
    screen: Screen,
    rng: &mut R,
) -> crate::Result<Vec<Chart>> {
    let run = ctx.run_id();
    let policy = ctx.policy_id().ok_or(Error::PolicyRequired)?;
    let policy_info = store.policy_info(policy)?;

    let mut aggregated = match ctx.mode() {
        Mode::Average => store.scan_policy_average(run, policy, aggregate_household)?,
        Mode::Random => {
            let household = store.random_household(run, policy, rng)?;
            store.scan_household(run, household, aggregate_household)?
        }
    };

    let prices = store.scan_prices(run, aggregate_price)?;

    let demand_crossing = aggregated
        .anchor(DEMAND)
        .map(|a| a.scaled(INDIVIDUAL_CROSSING));
    let appliances_crossing = aggregated
        .anchor(APPLIANCES)
        .map(|a| a.scaled(INDIVIDUAL_CROSSING));

    let prefix = ctx.mode().title_prefix();
    let label = ctx.run_label();

    Ok(vec![
        Chart::new(
            "policy-demand",
            format!("{prefix}Household Demand for Policy: {policy_info}\nfor run: {label}"),
            "Household Demand",
            Window::tile(screen, 2, 2, 0, 0),
        )
        .lines(single_line(&mut aggregated, DEMAND, "Demand", Color::BLUE))
        .crossing(demand_crossing)
        .zoom(INDIVIDUAL_ZOOM),
        Chart::new(
            "policy-appliances",
            format!(
                "{prefix}Household Active Appliances for Policy: {policy_info}\nfor run: {label}"
            ),
            "Active Appliances",
            Window::tile(screen, 2, 2, 1, 0),
        )
        .lines(single_line(
            &mut aggregated,
            APPLIANCES,
            "Appliances",
            Color::BLUE,
        ))
        .crossing(appliances_crossing)
        .zoom(INDIVIDUAL_ZOOM),
        price_chart(
            ctx,
            &prices,
            "policy-price-left",
            Window::tile(screen, 2, 2, 0, 1),
            Color::BLUE,
            INDIVIDUAL_CROSSING,
            INDIVIDUAL_ZOOM,
        ),
        price_chart(
            ctx,
            &prices,
            "policy-price-right",
            Window::tile(screen, 2, 2, 1, 1),
            Color::BLUE,
            INDIVIDUAL_CROSSING,
            INDIVIDUAL_ZOOM,
        ),
    ])
}

/// Supply against overall demand of a run on the top half of the screen,
/// and the run's price below.
///
/// # Errors
///
/// Returns error if the query or the aggregation failed.
pub fn supply_demand(store: &Store, ctx: &RunContext, screen: Screen) -> crate::Result<Vec<Chart>> {
    let mut aggregated = store.scan_aggregator(ctx.run_id(), |rows| {
        SeriesAggregator::unkeyed()
            .column(SUPPLY)
            .column(OVERALL_DEMAND)
            .column(PRICE)
            .run(rows)
    })?;

    let crossing = aggregated.combined_anchor(&[SUPPLY, OVERALL_DEMAND]);
    let price_crossing = aggregated.anchor(PRICE);

    let mut lines = single_line(&mut aggregated, OVERALL_DEMAND, "Overall Demand", Color::BLUE);
    lines.extend(single_line(&mut aggregated, SUPPLY, "Supply", Color::GREEN));

    let label = ctx.run_label();

    Ok(vec![
        Chart::new(
            "supply-demand",
            format!("Supply - Overall Demand\nfor run: {label}"),
            "Supply and Overall Demand",
            Window::tile(screen, 1, 2, 0, 0),
        )
        .lines(lines)
        .legend(Legend::north_right())
        .crossing(crossing)
        .zoom(SUPPLY_DEMAND_ZOOM),
        Chart::new(
            "supply-demand-price",
            format!("Price for run: {label}"),
            "Price",
            Window::tile(screen, 1, 2, 0, 1),
        )
        .lines(single_line(&mut aggregated, PRICE, "Price", Color::BLUE))
        .crossing(price_crossing)
        .zoom(SUPPLY_DEMAND_ZOOM),
    ])
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use test_log::test;

    const T0: i64 = 1_331_130_600_000;
    const TICK: i64 = 15 * 60 * 1_000;

    fn store() -> crate::Result<Store> {
        let store = Store::builder().create_schema(true).open_in_memory()?;

        store.batch(|s| {
            s.insert_run(1, T0)?;
            s.insert_policy(1, "greedy", "1")?;
            s.insert_policy(2, "thrifty", "3")?;

            s.assign_household(1, 1, 1)?;
            s.assign_household(1, 2, 1)?;
            s.assign_household(1, 3, 2)?;

            for idx in 0..4 {
                let tick = T0 + idx * TICK;
                let x = idx as f64;

                s.log_household(1, 1, tick, 2.0 + x, 2)?;
                s.log_household(1, 2, tick, 4.0 + x, 4)?;
                s.log_household(1, 3, tick, 1.0 + x, 1)?;
                s.log_aggregator(1, tick, 10.0 - x, 7.0 + x, 0.5 + x)?;
            }

            Ok(())
        })?;

        Ok(store)
    }

    #[test]
    fn chart_average_policies() -> crate::Result<()> {
        let store = store()?;
        let ctx = RunContext::load(&store, 1)?;
        let mut rng = StdRng::seed_from_u64(1);

        let charts = average_policies(&store, &ctx, Screen::default(), &mut rng)?;

        let names = charts.iter().map(|c| c.name.as_str()).collect::<Vec<_>>();
        assert_eq!(
            vec![
                "average-demand",
                "average-appliances",
                "average-price-left",
                "average-price-right"
            ],
            names
        );

        let demand = &charts[0];
        assert_eq!(
            "Average Demand across Policies\nfor run: 7 Mar 2012 14:30:00 GMT",
            demand.title
        );
        assert_eq!(
            vec!["greedy version 1", "thrifty version 3"],
            demand.lines.iter().map(|l| l.label.as_str()).collect::<Vec<_>>()
        );
        assert!(demand.lines.iter().all(|l| l.points.len() == 4));
        assert_eq!(Some(Legend::south()), demand.legend);

        let crossing = demand.crossing.expect("should have crossing");
        assert_eq!(T0, crossing.y_anchor);
        assert!((crossing.x_anchor - 0.95).abs() < 1e-9);

        // same policy, same color on both charts
        let appliances = &charts[1];
        assert_eq!(demand.lines[0].color, appliances.lines[0].color);
        assert_eq!(demand.lines[1].color, appliances.lines[1].color);
        assert_eq!(Window::tile(Screen::default(), 2, 2, 1, 0), appliances.window);

        let price = &charts[2];
        assert_eq!(1, price.lines.len());
        assert_eq!(4, price.lines[0].points.len());
        assert_eq!(demand.lines[0].color, price.lines[0].color);
        assert_eq!(charts[2].lines, charts[3].lines);
        assert_ne!(charts[2].window, charts[3].window);

        Ok(())
    }

    #[test]
    fn chart_individual_policy_average() -> crate::Result<()> {
        let store = store()?;
        let ctx = RunContext::load(&store, 1)?.with_policy(1, Mode::Average);
        let mut rng = StdRng::seed_from_u64(1);

        let charts = individual_policy(&store, &ctx, Screen::default(), &mut rng)?;
        assert_eq!(4, charts.len());

        let demand = &charts[0];
        assert!(demand.title.starts_with("Average Household Demand for Policy: greedy version 1"));
        assert_eq!(1, demand.lines.len());
        assert_eq!("Demand", demand.lines[0].label);
        assert_eq!(Color::BLUE, demand.lines[0].color);
        assert_eq!(3.0, demand.lines[0].points[0].value);

        let crossing = demand.crossing.expect("should have crossing");
        assert!((crossing.x_anchor - 3.0 * 0.97).abs() < 1e-9);

        let appliances = &charts[1];
        assert_eq!("Appliances", appliances.lines[0].label);
        assert!((appliances.crossing.map_or(0.0, |c| c.x_anchor) - 2.91).abs() < 1e-9);

        Ok(())
    }

    #[test]
    fn chart_individual_policy_random() -> crate::Result<()> {
        let store = store()?;
        let ctx = RunContext::load(&store, 1)?.with_policy(1, Mode::Random);
        let mut rng = StdRng::seed_from_u64(9);

        let charts = individual_policy(&store, &ctx, Screen::default(), &mut rng)?;

        let demand = &charts[0];
        assert!(demand.title.starts_with("Random Household Demand"));

        // either household 1 or 2, never an average of both
        let first = demand.lines[0].points[0].value;
        assert!(first == 2.0 || first == 4.0);

        Ok(())
    }

    #[test]
    fn chart_individual_policy_requires_policy() -> crate::Result<()> {
        let store = store()?;
        let ctx = RunContext::load(&store, 1)?;
        let mut rng = StdRng::seed_from_u64(1);

        assert!(matches!(
            individual_policy(&store, &ctx, Screen::default(), &mut rng),
            Err(Error::PolicyRequired)
        ));

        let ctx = ctx.with_policy(3, Mode::Average);
        assert!(matches!(
            individual_policy(&store, &ctx, Screen::default(), &mut rng),
            Err(Error::UnknownPolicy(3))
        ));

        Ok(())
    }

    #[test]
    fn chart_supply_demand() -> crate::Result<()> {
        let store = store()?;
        let ctx = RunContext::load(&store, 1)?;

        let charts = supply_demand(&store, &ctx, Screen::default())?;
        assert_eq!(2, charts.len());

        let overview = &charts[0];
        assert_eq!(
            vec!["Overall Demand", "Supply"],
            overview.lines.iter().map(|l| l.label.as_str()).collect::<Vec<_>>()
        );
        assert_eq!(Color::GREEN, overview.lines[1].color);
        assert_eq!(1_920, overview.window.width);

        // supply falls to 7.0 while demand starts at 7.0
        let crossing = overview.crossing.expect("should have crossing");
        assert_eq!(7.0, crossing.x_anchor);
        assert_eq!(T0, crossing.y_anchor);

        let price = &charts[1];
        assert_eq!(Some(0.5), price.crossing.map(|c| c.x_anchor));
        assert_eq!(540, price.window.y);

        Ok(())
    }

    #[test]
    fn chart_empty_run_has_no_crossing() -> crate::Result<()> {
        let store = store()?;
        store.insert_run(2, T0)?;
        let ctx = RunContext::load(&store, 2)?;
        let mut rng = StdRng::seed_from_u64(1);

        let charts = average_policies(&store, &ctx, Screen::default(), &mut rng)?;
        assert!(charts.iter().all(|c| c.lines.is_empty()));
        assert!(charts.iter().all(|c| c.crossing.is_none()));

        let charts = supply_demand(&store, &ctx, Screen::default())?;
        assert!(charts.iter().all(|c| c.crossing.is_none()));

        Ok(())
    }
}
