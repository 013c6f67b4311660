//! Browser glue for the map page.
//!
//! The script holds no state of its own beyond Leaflet objects: every user
//! action is posted to the API and the returned render commands are replayed
//! in order.

pub fn render_map_js() -> &'static str {
    MAP_JS
}

const MAP_JS: &str = r#"
(function () {
    const CATEGORIES = ['green', 'orange', 'red', 'grey', 'black'];
    const map = L.map('map', {
        center: [54, -2], zoom: 2, worldCopyJump: true, zoomControl: false, attributionControl: false
    });
    L.tileLayer('https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png', { noWrap: false }).addTo(map);

    const clusters = {};
    CATEGORIES.forEach(cat => { clusters[cat] = L.markerClusterGroup({ showCoverageOnHover: false }); });

    let markers = {};
    let linkLayers = [];
    let extraMarkers = [];
    let activeId = null;

    map.on('popupopen', e => {
        const source = e.popup._source;
        if (source && source.recordId) activeId = source.recordId;
    });

    function dot(category, big) {
        const size = big ? 24 : 12;
        const border = big ? 2 : 1;
        return L.divIcon({
            html: `<div style="background-color:${category}; width:${size}px; height:${size}px; border-radius:50%; border:${border}px solid black;"></div>`,
            className: '',
            iconSize: [size, size]
        });
    }

    function toast(message, ms) {
        const el = document.createElement('div');
        el.className = 'toast';
        el.innerText = message;
        document.body.appendChild(el);
        setTimeout(() => el.remove(), ms || 3000);
    }

    function setLegend(category, visible) {
        const item = document.querySelector(`.legend-item[data-category="${category}"]`);
        if (!item) return;
        item.setAttribute('data-active', visible ? 'true' : 'false');
        item.classList.toggle('inactive', !visible);
    }

    function apply(commands) {
        (commands || []).forEach(c => {
            switch (c.op) {
            case 'clear_markers':
                CATEGORIES.forEach(cat => clusters[cat].clearLayers());
                markers = {};
                break;
            case 'plot_record': {
                const m = L.marker([c.at.lat, c.at.lng], { title: c.title, icon: dot(c.category, false) })
                    .bindPopup(c.popup_html);
                m.recordId = c.id;
                m.category = c.category;
                markers[c.id] = m;
                clusters[c.category].addLayer(m);
                break;
            }
            case 'draw_link': {
                const p = [c.endpoints.primary.lat, c.endpoints.primary.lng];
                const q = [c.endpoints.counterpart.lat, c.endpoints.counterpart.lng];
                linkLayers.push(L.polyline([q, p], { color: 'red', weight: 3 }).addTo(map));
                const m = markers[c.id];
                if (m) m.setIcon(dot(c.category, true));
                const extra = L.marker(q, { icon: dot(c.category, true) }).addTo(map);
                if (m) extra.bindPopup(m.getPopup().getContent());
                extraMarkers.push(extra);
                document.getElementById('clearLinksButton').style.display = '';
                break;
            }
            case 'remove_all_links':
                linkLayers.forEach(l => map.removeLayer(l));
                extraMarkers.forEach(m => map.removeLayer(m));
                linkLayers = [];
                extraMarkers = [];
                Object.values(markers).forEach(m => m.setIcon(dot(m.category, false)));
                document.getElementById('clearLinksButton').style.display = 'none';
                break;
            case 'set_layer_visible':
                if (c.visible && !map.hasLayer(clusters[c.category])) map.addLayer(clusters[c.category]);
                if (!c.visible && map.hasLayer(clusters[c.category])) map.removeLayer(clusters[c.category]);
                setLegend(c.category, c.visible);
                break;
            case 'set_view':
                map.setView([c.center.lat, c.center.lng], c.zoom);
                break;
            case 'fit_bounds':
                map.fitBounds([[c.south, c.west], [c.north, c.east]]);
                break;
            case 'reveal_record': {
                const m = markers[c.id];
                if (m) clusters[m.category].zoomToShowLayer(m, () => m.openPopup());
                break;
            }
            case 'notify':
                toast(c.message);
                break;
            }
        });
    }

    async function call(method, url, body) {
        const init = { method, headers: {} };
        if (body !== undefined) {
            init.headers['content-type'] = 'application/json';
            init.body = JSON.stringify(body);
        }
        const response = await fetch(url, init);
        const data = await response.json().catch(() => ({}));
        if (data.commands) apply(data.commands);
        if (data.error) toast(data.error);
        return data;
    }

    async function start() {
        await call('GET', '/api/records');
        if (window.location.search) {
            await call('GET', '/api/restore' + window.location.search);
        }
    }

    document.getElementById('searchInput').addEventListener('keyup', async function () {
        const results = document.getElementById('searchResults');
        const q = this.value.trim();
        if (q === '') { results.innerHTML = ''; return; }
        const data = await call('GET', '/api/search?q=' + encodeURIComponent(q));
        results.innerHTML = '';
        (data.results || []).forEach(r => {
            const div = document.createElement('div');
            div.className = 'result-item';
            div.innerText = r.title;
            div.addEventListener('click', () => apply([{ op: 'reveal_record', id: r.id }]));
            results.appendChild(div);
        });
    });

    document.getElementById('placeSearchInput').addEventListener('keypress', async function (e) {
        if (e.key !== 'Enter') return;
        e.preventDefault();
        const results = document.getElementById('placeSearchResults');
        results.innerHTML = '';
        const q = this.value.trim();
        if (q === '') return;
        const data = await call('GET', '/api/places?q=' + encodeURIComponent(q));
        const places = data.places || [];
        if (places.length === 0 && !data.error) {
            results.innerText = 'No results found.';
            return;
        }
        places.forEach(p => {
            const div = document.createElement('div');
            div.className = 'result-item';
            div.innerText = p.display_name;
            div.addEventListener('click', () => {
                apply([p.view]);
                results.innerHTML = '';
                this.value = p.display_name;
            });
            results.appendChild(div);
        });
    });

    document.querySelectorAll('.legend-item').forEach(item => {
        item.addEventListener('click', function () {
            const visible = this.getAttribute('data-active') !== 'true';
            call('POST', '/api/layers/' + this.getAttribute('data-category'), { visible });
        });
    });

    document.querySelectorAll('input[name="locationMode"]').forEach(radio => {
        radio.addEventListener('change', function () { call('POST', '/api/mode/' + this.value); });
    });

    document.addEventListener('click', e => {
        const button = e.target.closest('.show-link');
        if (button) call('POST', '/api/links/' + encodeURIComponent(button.getAttribute('data-company')));
    });

    document.getElementById('clearLinksButton').addEventListener('click', () => call('DELETE', '/api/links'));

    document.getElementById('selectAreaButton').addEventListener('click', () => {
        const control = new L.Control.Draw({
            draw: { polyline: false, polygon: false, circle: false, marker: false, circlemarker: false,
                    rectangle: { shapeOptions: { color: 'blue' } } },
            edit: { featureGroup: new L.FeatureGroup() }
        });
        map.addControl(control);
        new L.Draw.Rectangle(map, control.options.draw.rectangle).enable();
        map.once(L.Draw.Event.CREATED, e => {
            map.removeControl(control);
            const b = e.layer.getBounds();
            call('POST', '/api/links/select', {
                south: b.getSouth(), west: b.getWest(), north: b.getNorth(), east: b.getEast()
            });
        });
    });

    document.getElementById('shareViewButton').addEventListener('click', async () => {
        const center = map.getCenter();
        const data = await call('POST', '/api/share', {
            center: { lat: center.lat, lng: center.lng },
            zoom: Math.round(map.getZoom()),
            popup: activeId,
            base: window.location.href
        });
        if (data.warning) toast(data.warning);
        if (data.url) {
            document.getElementById('shareUrlInput').value = data.url;
            document.getElementById('shareUrlContainer').style.display = 'block';
        }
    });

    document.getElementById('copyShareUrlButton').addEventListener('click', () => {
        const input = document.getElementById('shareUrlInput');
        navigator.clipboard.writeText(input.value).then(
            () => { toast('URL copied to clipboard!', 2000); document.getElementById('shareUrlContainer').style.display = 'none'; },
            () => toast('Failed to copy URL.', 2000)
        );
    });

    start();
})();
"#;
